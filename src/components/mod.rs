//! UI components.

pub mod apex_tree;
