//! Typed client for the Facebook Graph API.
//!
//! Users, albums and photos are modelled as typed *nodes*. Nodes of some
//! kinds can be *connected* to a parent node: listed under it, or created
//! beneath it. Every outbound request passes through an [`Authorizer`] that
//! stamps the access token on it.
//!
//! # Crate layout
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`node`] | Node model: [`NodeKind`], [`Node`], [`NodeType`], [`Connectable`] and the generic fetch/list/append operations |
//! | [`user`], [`album`], [`photo`] | Concrete kinds and their domain operations |
//! | [`authorizer`] | [`Authorizer`] trait, [`SimpleAuthorizer`], [`AccountAuthorizer`] |
//! | [`client`] | [`GraphClient`] and [`Call`], the transport facade |
//! | [`transport`] | The HTTP seam: [`Transport`] and its `reqwest` implementation |
//! | [`wire`] | Response envelopes |
//! | [`tasks`] | Async variants of the blocking operations |
//! | [`config`] | [`GraphConfig`] and its environment variables |
//! | [`error`] | [`GraphError`] |
//!
//! # Quick start
//!
//! ```rust,ignore
//! use fbgraph::{GraphClient, GraphConfig, SimpleAuthorizer, User};
//!
//! let client = GraphClient::new(&GraphConfig::from_env()?)?;
//! let auth = SimpleAuthorizer::new("<access token>");
//!
//! let me = User::get_me(&client, &auth)?;
//! for album in me.albums(&client, &auth)? {
//!     println!("{} ({} photos)", album.name, album.count);
//! }
//! ```

pub mod album;
pub mod authorizer;
pub mod client;
pub mod config;
pub mod error;
pub mod node;
pub mod photo;
pub mod tasks;
pub mod transport;
pub mod user;
pub mod wire;

#[cfg(test)]
mod testing;

pub use album::Album;
pub use authorizer::{
    AccountAuthorizer, AccountProvider, Authorizer, ProviderError, SimpleAuthorizer,
};
pub use client::{Call, GraphClient};
pub use config::GraphConfig;
pub use error::{GraphError, NotConnectable};
pub use node::{Connectable, Connections, Node, NodeFields, NodeKind, NodeType, PostParams};
pub use photo::{Photo, PhotoImage};
pub use transport::{HttpRequest, HttpResponse, Method, ReqwestTransport, Transport};
pub use user::User;
