//! Services layer - Business logic
//!
//! This module contains the domain services for Fitlog.
//! Services are responsible for:
//! - Validating input into field-level errors
//! - Scoping every workout and entry operation to the calling user
//! - Issuing and checking authentication tokens

pub mod entry;
pub mod exercise;
pub mod password;
pub mod stats;
pub mod token;
pub mod user;
pub mod workout;

pub use entry::{EntryService, EntryServiceError};
pub use exercise::{ExerciseService, ExerciseServiceError};
pub use password::{hash_password, verify_password};
pub use stats::StatsService;
pub use token::{Claims, TokenError, TokenKind, TokenPair, TokenService};
pub use user::{UserService, UserServiceError};
pub use workout::{WorkoutService, WorkoutServiceError};
