//! Constants used throughout the Sealnote library.
//!
//! This module provides central definitions for size limits and other constants
//! enforced at the service and persistence boundaries.

/// Maximum size of a note's content in bytes (1 MiB), enforced at the boundary.
pub const MAX_NOTE_CONTENT_SIZE: usize = 1 << 20;

/// Maximum length of a principal's username in characters.
pub const MAX_USERNAME_LEN: usize = 255;

/// Minimum length of a username accepted at registration.
pub const MIN_USERNAME_LEN: usize = 4;

/// Minimum password length, enforced by the service layer.
pub const MIN_PASSWORD_LEN: usize = 8;
