//! Statistical summaries for rewards and evaluation scores.
//!
//! - [`descriptive`]: Mean, median, variance, standard deviation, range
//! - [`percentiles`]: Nearest-rank percentiles of a dataset
//!
//! # Examples
//!
//! ```
//! use playcall_stats::descriptive::DescriptiveStats;
//!
//! let rewards = [-0.5, 0.0, 0.5, 1.0, 1.5];
//! let stats = DescriptiveStats::new(rewards).unwrap();
//! assert_eq!(stats.mean, 0.5);
//! assert_eq!(stats.count, 5);
//! ```
//!
//! ```
//! use playcall_stats::percentiles::Percentiles;
//!
//! let rewards = [1.0, 2.0, 3.0, 4.0, 5.0];
//! let quartiles = Percentiles::new(&rewards, &[25.0, 50.0, 75.0]);
//! assert_eq!(quartiles.get(50.0), Some(3.0));
//! ```

pub mod descriptive;
pub mod percentiles;
