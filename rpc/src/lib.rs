//! HTTP API.
//!
//! Routes, all JSON unless noted:
//!
//! | Method & path | Auth |
//! |---|---|
//! | `GET /` (plain text) | none |
//! | `POST /api/auth/register` (JSON or multipart) | none |
//! | `POST /api/auth/login` | none |
//! | `GET /api/auth/profile` | bearer |
//! | `POST /api/auth/logout` | bearer |
//! | `GET /api/auth/history` | bearer |
//! | `POST /api/signatures/reference` (multipart) | bearer |
//! | `POST /api/signatures/verify` (multipart) | bearer |
//! | `GET /api/signatures/references` | bearer |
//! | `GET`/`DELETE /api/signatures/:id` | bearer |
//! | `GET /api/signatures/:id/image` (raw bytes) | bearer |
//! | `GET /api/admin/users` | bearer, admin |
//!
//! Errors render as `{"success": false, "message": ...}`.

pub mod auth;
pub mod error;
pub mod handlers;
pub mod multipart;
pub mod server;

pub use auth::AuthSession;
pub use error::{ApiError, RpcError};
pub use server::{router, AppState, RpcConfig, RpcServer};
