//! # Gallery
//!
//! Fetches portfolio projects and their cover images from a creative-network
//! API, stores one record per creator in SQLite, and serves the records over
//! a small HTTP API.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐   ┌─────────────┐   ┌──────────┐
//! │ Portfolio API│──▶│  Ingestor   │──▶│  SQLite   │
//! │  (client)    │   │ worker pool │   │ records  │
//! └──────────────┘   └──────┬──────┘   └────┬─────┘
//!                           ▼               │
//!                     ┌──────────┐          ▼
//!                     │ ./photos │◀──── HTTP server
//!                     └──────────┘   GET / · POST /q · /imgs
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! gallery init           # create database
//! gallery ingest         # fetch records and images
//! gallery serve          # start HTTP server
//! gallery run            # all of the above, then open a browser
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`models`] | Record, query, and upstream API types |
//! | [`db`] | Database connection |
//! | [`migrate`] | Schema creation |
//! | [`store`] | Record store trait with SQLite and in-memory backends |
//! | [`client`] | Portfolio API client |
//! | [`assets`] | Cover image downloads |
//! | [`ingest`] | Ingestion loop |
//! | [`export`] | JSON record dumps |
//! | [`server`] | HTTP query service |
//! | [`browser`] | Opening URLs in a browser |

pub mod assets;
pub mod browser;
pub mod client;
pub mod config;
pub mod db;
pub mod export;
pub mod ingest;
pub mod migrate;
pub mod models;
pub mod server;
pub mod store;
