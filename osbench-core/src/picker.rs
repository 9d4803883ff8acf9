use std::str::FromStr;
use std::sync::atomic::{AtomicU64, Ordering};

use rand::Rng;

use crate::{Config, Error, Result};

const DEFAULT_CONTAINER_PREFIX: &str = "mycontainers";
const DEFAULT_OBJECT_PREFIX: &str = "myobjects";

/// Which dimension of the object space is partitioned across workers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, strum::Display, strum::EnumString)]
#[strum(serialize_all = "snake_case")]
pub enum Division {
    #[default]
    None,
    Container,
    Object,
}

impl Division {
    pub fn parse(s: &str) -> Result<Self> {
        let s = s.trim();
        if s.is_empty() {
            return Ok(Self::None);
        }
        s.parse().map_err(|_| Error::InvalidDivision(s.to_string()))
    }
}

/// Integer selector, written `c(n)`, `u(lo,hi)` or `s(lo,hi)`.
#[derive(Debug)]
pub enum IntSelector {
    Constant(u64),
    Uniform { lo: u64, hi: u64 },
    Sequential { lo: u64, hi: u64, cursor: AtomicU64 },
}

impl IntSelector {
    /// Draws the next value from the slice of the range owned by worker `index` of `total`
    /// when `divided` is set, or from the whole range otherwise.
    pub fn next<R: Rng + ?Sized>(
        &self,
        rng: &mut R,
        divided: bool,
        index: usize,
        total: usize,
    ) -> u64 {
        match self {
            Self::Constant(n) => *n,
            Self::Uniform { lo, hi } => {
                let (lo, hi) = slice_bounds(*lo, *hi, divided, index, total);
                rng.random_range(lo..=hi)
            }
            Self::Sequential { lo, hi, cursor } => {
                let (lo, hi) = slice_bounds(*lo, *hi, divided, index, total);
                let span = u128::from(hi - lo) + 1;
                let step = u128::from(cursor.fetch_add(1, Ordering::Relaxed));
                lo + (step % span) as u64
            }
        }
    }
}

/// Splits `[lo, hi]` into `total` contiguous slices and returns slice `index`.
///
/// A slice that would be empty collapses to a single value so every worker still gets a
/// deterministic target.
fn slice_bounds(lo: u64, hi: u64, divided: bool, index: usize, total: usize) -> (u64, u64) {
    if !divided || total <= 1 {
        return (lo, hi);
    }

    let len = u128::from(hi - lo) + 1;
    let total = total as u128;
    let index = (index as u128).min(total - 1);

    let start = len * index / total;
    let end = len * (index + 1) / total;
    if start == end {
        let at = lo + start.min(len - 1) as u64;
        return (at, at);
    }
    (lo + start as u64, lo + (end - 1) as u64)
}

impl FromStr for IntSelector {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        let invalid = || Error::InvalidSelector(s.to_string());

        let trimmed = s.trim();
        let (kind, rest) = trimmed.split_once('(').ok_or_else(invalid)?;
        let args = rest.strip_suffix(')').ok_or_else(invalid)?;
        let nums: Vec<u64> = args
            .split(',')
            .map(|a| a.trim().parse::<u64>())
            .collect::<std::result::Result<_, _>>()
            .map_err(|_| invalid())?;

        match (kind.trim(), nums.as_slice()) {
            ("c", [n]) => Ok(Self::Constant(*n)),
            ("u", [lo, hi]) if lo <= hi => Ok(Self::Uniform { lo: *lo, hi: *hi }),
            ("s", [lo, hi]) if lo <= hi => Ok(Self::Sequential {
                lo: *lo,
                hi: *hi,
                cursor: AtomicU64::new(0),
            }),
            _ => Err(invalid()),
        }
    }
}

/// Chooses the container/object pair an operation targets.
#[derive(Debug)]
pub struct ObjectPicker {
    division: Division,
    containers: IntSelector,
    objects: IntSelector,
    container_prefix: String,
    container_suffix: String,
    object_prefix: String,
    object_suffix: String,
}

impl ObjectPicker {
    /// Picker for list operations: `containers` defaults to `c(1)` and `objects` (used as the
    /// listing prefix) to `c(1)`.
    pub fn for_lister(division: &str, config: &Config) -> Result<Self> {
        Ok(Self {
            division: Division::parse(division)?,
            containers: config.get_or("containers", "c(1)").parse()?,
            objects: config.get_or("objects", "c(1)").parse()?,
            container_prefix: config
                .get_or("cprefix", DEFAULT_CONTAINER_PREFIX)
                .to_string(),
            container_suffix: config.get_or("csuffix", "").to_string(),
            object_prefix: config.get_or("oprefix", DEFAULT_OBJECT_PREFIX).to_string(),
            object_suffix: config.get_or("osuffix", "").to_string(),
        })
    }

    pub fn division(&self) -> Division {
        self.division
    }

    pub fn pick_target_path<R: Rng + ?Sized>(
        &self,
        rng: &mut R,
        index: usize,
        total: usize,
    ) -> (String, String) {
        let container = self.containers.next(
            rng,
            self.division == Division::Container,
            index,
            total,
        );
        let object = self
            .objects
            .next(rng, self.division == Division::Object, index, total);

        (
            format!(
                "{}{container}{}",
                self.container_prefix, self.container_suffix
            ),
            format!("{}{object}{}", self.object_prefix, self.object_suffix),
        )
    }
}
