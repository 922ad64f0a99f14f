//! # Character Tally
//!
//! Fetches random characters from public catalogs (Rick and Morty, PokéAPI,
//! Superhero API, Dragon Ball API), normalizes them to one shape, and keeps
//! a tally of likes and dislikes per character.
//!
//! ## Architecture
//!
//! ```text
//! ┌──────────────┐   ┌───────────────────┐   ┌──────────┐
//! │   Adapters   │──▶│ CharacterService  │──▶│  SQLite  │
//! │ R&M/Poké/... │   │ pick + upsert     │   │  tally   │
//! └──────┬───────┘   └─────────┬─────────┘   └──────────┘
//!        │                     │
//!  ┌─────▼──────┐        ┌─────┴─────┐
//!  │ CountCache │        ▼           ▼
//!  └────────────┘   ┌────────┐  ┌────────┐
//!                   │  CLI   │  │  HTTP  │
//!                   │(tally) │  │ (axum) │
//!                   └────────┘  └────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! tally init                         # create database
//! tally random --source pokemon      # fetch and record a character
//! tally vote pokemon 25 Pikachu like
//! tally top liked
//! tally serve                        # start HTTP server
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration and environment overrides |
//! | [`transport`] | Outbound HTTP abstraction |
//! | [`traits`] | `SourceAdapter` trait and registry |
//! | [`adapter_rickandmorty`] | Rick and Morty API adapter |
//! | [`adapter_pokemon`] | PokéAPI adapter |
//! | [`adapter_superhero`] | Superhero API adapter |
//! | [`adapter_dragonball`] | Dragon Ball API adapter |
//! | [`service`] | Random fetch, votes and tally queries |
//! | [`sqlite_store`] | SQLite tally store |
//! | [`sources`] | Source availability listing |
//! | [`server`] | HTTP server |
//! | [`db`] | Database connection |
//! | [`migrate`] | Schema migrations |
//!
//! Models, the error type, the count cache and the in-memory store live in
//! the `character-tally-core` crate and are re-exported here.

pub mod adapter_dragonball;
pub mod adapter_pokemon;
pub mod adapter_rickandmorty;
pub mod adapter_superhero;
pub mod config;
pub mod db;
pub mod migrate;
pub mod server;
pub mod service;
pub mod sources;
pub mod sqlite_store;
pub mod traits;
pub mod transport;

pub use character_tally_core::{cache, models, random, store};
pub use character_tally_core::{Character, Source, TallyError, Vote};
