//! Session operations.
//!
//! The write half turns a [`SessionCmd`](crate::SessionCmd) into a committed
//! visit through the check/allocate/apply pipeline; the read half serves
//! single visits and filtered listings.

mod list;
mod write;
