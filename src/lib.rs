//! # tube-cn: Contractor Networks in Rust
//!
//! **`tube-cn`** is a guaranteed constraint-propagation engine over intervals and tubes.
//! It narrows uncertain quantities until they satisfy a network of constraints, without ever
//! discarding a feasible value. It is designed for reliable state estimation and verification.
//!
//! ## What is a Contractor Network?
//!
//! A contractor is an operator that narrows a set-valued variable (an interval, a box, a tube)
//! while keeping every value consistent with one constraint. A contractor network links many
//! contractors through the variables they share, and applies them until no variable shrinks
//! anymore: a fixed point.
//!
//! ## Key Features
//!
//! - **Network-Centric Architecture**: All variables and contractors are owned by the
//!   [`ContractorNetwork`][crate::network::ContractorNetwork]. Callers hold lightweight
//!   [`DomainId`][crate::types::DomainId] handles.
//! - **Structural Decomposition**: Vectors are split into their components and tubes into their
//!   slices, so a contraction on `x[0]` or on one slice of a tube reaches every contractor that
//!   depends on it.
//! - **Incremental Propagation**: Only the contractors of a domain that shrank enough are run
//!   again. The threshold is the *fixpoint ratio*.
//! - **Real-Time Data**: Bounded measurements can be streamed into a tube with
//!   [`add_data`][crate::network::ContractorNetwork::add_data].
//!
//! ## Basic Usage
//!
//! ```rust
//! use tube_cn::contractor::Ctc;
//! use tube_cn::ctc::CtcAdd;
//! use tube_cn::interval::Interval;
//! use tube_cn::network::ContractorNetwork;
//!
//! // 1. Initialize the network
//! let mut cn = ContractorNetwork::new();
//!
//! // 2. Create variables
//! let a = cn.create_dom(Interval::new(0.0, 1.0)).unwrap();
//! let b = cn.create_dom(Interval::new(-1.0, 1.0)).unwrap();
//! let c = cn.create_dom(Interval::new(1.5, 2.0)).unwrap();
//!
//! // 3. Add a constraint: a + b = c
//! cn.add(&Ctc::new_static(CtcAdd), &[a, b, c]).unwrap();
//!
//! // 4. Propagate
//! cn.contract(false).unwrap();
//! assert_eq!(cn.interval(a).unwrap(), Interval::new(0.5, 1.0));
//! assert_eq!(cn.interval(b).unwrap(), Interval::new(0.5, 1.0));
//! ```
//!
//! ## Core Components
//!
//! - **[`network`]**: The [`ContractorNetwork`][crate::network::ContractorNetwork] and graph construction.
//! - **[`solve`]**: The propagation loop.
//! - **[`domain`]**: Domain values, identity and volume.
//! - **[`contractor`]**: Operator traits and contractor dispatch.

pub mod arena;
pub mod config;
pub mod contractor;
pub mod ctc;
pub mod debug;
pub mod domain;
pub mod error;
pub mod interval;
pub mod network;
pub mod solve;
pub mod trajectory;
pub mod tube;
pub mod types;
