//! Client-side session lifecycle manager: single-flight token refresh with transparent request
//! replay, idle detection with a warning countdown, and one converging logout path.
//!
//! The crate is organized leaves first:
//!
//! - [`store`] persists the access token, refresh token, and cached profile.
//! - [`refresh`] attaches bearer credentials and serializes concurrent `401` recoveries behind a
//!   single refresh call.
//! - [`idle`] watches activity signals and runs the warning countdown.
//! - [`session`] composes everything into [`session::SessionManager`].

#![deny(clippy::all, missing_docs, unused_crate_dependencies)]

pub mod api;
pub mod auth;
pub mod config;
pub mod error;
pub mod http;
pub mod idle;
pub mod obs;
pub mod refresh;
pub mod session;
pub mod store;

mod _prelude {
	pub use std::{
		collections::{BTreeSet, HashMap},
		error::Error as StdError,
		fmt::{Debug, Display, Formatter, Result as FmtResult},
		future::Future,
		pin::Pin,
		str::FromStr,
		sync::{Arc, Weak},
		time::Duration,
	};

	pub use parking_lot::{Mutex, RwLock};
	#[cfg(feature = "reqwest")]
	pub use reqwest::{Client as ReqwestClient, Error as ReqwestError, Url};
	pub use serde::{Deserialize, Serialize};
	pub use thiserror::Error as ThisError;
	pub use time::OffsetDateTime;
	pub use tokio::time::Instant;

	pub use crate::error::{Error, Result};
}

#[cfg(feature = "reqwest")] pub use reqwest;
#[cfg(all(test, feature = "reqwest"))] use {color_eyre as _, httpmock as _};
