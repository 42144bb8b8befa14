//! Error types for the tree bridge.
//!
//! None of these cross the host boundary: every lifecycle operation logs the
//! error and reports a plain `bool`.

use thiserror::Error;

/// Failures raised while driving a tree instance.
#[derive(Debug, Error)]
pub enum BridgeError {
	#[error("element '{0}' not found")]
	ElementNotFound(String),

	#[error("ApexTree library not loaded")]
	EngineNotLoaded,

	#[error("ApexTree.setLicense not available")]
	LicenseHookUnavailable,

	#[error("license key cannot be empty")]
	InvalidLicenseKey,

	#[error("tree instance not found for '{0}'")]
	UnknownContainer(String),

	#[error("tree '{0}' has not been rendered")]
	NotRendered(String),

	#[error("instance registry is busy")]
	RegistryBusy,

	#[error("DOM operation failed: {0}")]
	Dom(String),

	#[error(transparent)]
	Engine(#[from] EngineError),
}

/// An exception thrown by the wrapped rendering engine.
#[derive(Clone, Debug, Error, PartialEq, Eq)]
#[error("{message}")]
pub struct EngineError {
	message: String,
}

impl EngineError {
	pub fn new(message: impl Into<String>) -> Self {
		Self {
			message: message.into(),
		}
	}

	pub fn message(&self) -> &str {
		&self.message
	}
}

/// Delivery failure of a node event to the host.
#[derive(Debug, Error)]
pub enum SinkError {
	#[error("host callback has been disposed")]
	Disposed,

	#[error("host rejected event: {0}")]
	Rejected(String),
}
