#![forbid(unsafe_code)]

pub mod card_stack;
pub mod error;
pub mod model;
pub mod time;

pub use card_stack::{
    CardStack, SWIPE_THRESHOLD, StackObserver, StackTransition, SwipeOutcome, SwipeTracker,
};
pub use error::Error;
pub use time::Clock;
