//! PiPet Core - Virtual Pet Simulation Engine
//!
//! Stateful wrapper around the rules in `pipet-logic`: a [`engine::PetEngine`]
//! that ticks and reacts to actions, a crash-safe JSON save file, and a
//! [`session::PetSession`] that ties both to a clock for a front end's
//! control loop. Balance numbers can come from a JSON tuning file
//! ([`tuning`]).
//!
//! # Example
//!
//! ```rust,no_run
//! use pipet_core::prelude::*;
//!
//! let mut session = PetSession::start(
//!     sim_config_from_env()?,
//!     SessionConfig::from_env(),
//!     SystemClock,
//! )?;
//!
//! session.act(Action::Feed);
//!
//! // Run simulation
//! loop {
//!     for event in session.tick().events {
//!         println!("{event:?}");
//!     }
//!     if !session.snapshot().is_alive {
//!         break;
//!     }
//!     std::thread::sleep(std::time::Duration::from_secs(1));
//! }
//! session.shutdown()?;
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```

pub mod clock;
pub mod engine;
pub mod persistence;
pub mod session;
pub mod tuning;

/// Commonly used types for convenient importing
pub mod prelude {
    pub use crate::clock::{Clock, ManualClock, SystemClock};
    pub use crate::engine::{ActionOutcome, PetEngine, PetSnapshot, TickReport};
    pub use crate::persistence::{SaveError, SaveFile};
    pub use crate::session::{PetSession, SessionConfig, SessionError};
    pub use crate::tuning::{load_tuning, sim_config_from_env, TuningError};
    pub use pipet_logic::actions::{Action, Rejection};
    pub use pipet_logic::config::SimConfig;
    pub use pipet_logic::lifecycle::PetEvent;
    pub use pipet_logic::stage::{Branch, LifeStage};
    pub use pipet_logic::stats::{PetStats, StatKind};
}
