//! Vitrine - Company website CMS backend
//!
//! This library provides the core functionality for the Vitrine CMS:
//! content management (news, products, projects, services, events,
//! comments, settings) behind a REST API with JWT authentication.

pub mod api;
pub mod config;
pub mod db;
pub mod models;
pub mod services;
