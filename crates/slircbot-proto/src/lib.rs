//! # slircbot-proto
//!
//! Protocol vocabulary shared by the slircbot runtime and its plugins.
//!
//! This crate sits at the wire boundary: it names the inbound events the
//! bot reacts to and validates the user-supplied strings (channels,
//! nicknames, hostmasks) that admin commands accept. Raw line parsing and
//! the socket transport live elsewhere.
//!
//! ```rust
//! use slircbot_proto::{ChannelExt, EventKind, Hostmask, IrcEvent};
//!
//! assert!("#straylight".is_channel_name());
//! assert!(Hostmask::parse("nick!ident@host.example").is_ok());
//!
//! let event = IrcEvent::new(EventKind::SelfJoin).with_channel("#straylight");
//! assert_eq!(event.channel.as_deref(), Some("#straylight"));
//! ```

#![deny(clippy::all)]
#![warn(missing_docs)]

pub mod casemap;
pub mod chan;
pub mod event;
pub mod hostmask;
pub mod nick;

pub use self::casemap::{irc_eq, irc_lower_char, irc_to_lower};
pub use self::chan::ChannelExt;
pub use self::event::{EventKind, EventSender, EventTarget, IrcEvent};
pub use self::hostmask::{Hostmask, HostmaskError};
pub use self::nick::{NickExt, DEFAULT_NICK_MAX_LEN};
