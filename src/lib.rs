pub mod api;
pub mod auth;
pub mod config;
pub mod db;
pub mod domain;
pub mod error;
pub mod policy;
pub mod repository;
pub mod seed;
pub mod service;
