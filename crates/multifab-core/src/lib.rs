//! Multi-process factory scheduler.
//!
//! A [`factory::Factory`] owns a fixed number of recipe processes and is
//! driven once per host tick. Each tick it optionally rebalances stacked
//! inputs across processes ([`sort`]), advances every process against its
//! cached recipe, and publishes a read-only [`query::FactorySnapshot`].
//!
//! Recipes are supplied by the host through [`recipe::RecipeLookup`].

pub mod computer;
pub mod config;
pub mod dirty;
pub mod energy;
pub mod factory;
pub mod fixed;
pub mod id;
pub mod item;
pub mod process;
pub mod query;
pub mod recipe;
pub mod serialize;
pub mod sim;
pub mod sort;
pub mod tier;
pub mod upgrade;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
