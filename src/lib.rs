//! Delivery lifecycle tracking service.
//!
//! The core is [`domain::delivery::Delivery`], an aggregate whose status only
//! changes through guarded transitions. Around it sit a command handler that
//! persists through [`store::DeliveryStore`], and an actix-web gateway in
//! [`api`].

pub mod api;
pub mod config;
pub mod domain;
pub mod event_sourcing;
pub mod metrics;
pub mod store;
