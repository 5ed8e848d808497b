//! Extraction of headline metrics from gem5 `stats.txt` dumps.

use std::{fmt, path::Path, str::FromStr, sync::OnceLock};

use hashbrown::HashMap;
use regex::Regex;
use tracing::warn;

use crate::error::{Error, Result};

const FLOAT: &str = r"([\d\.e\-\+]+)";
const INT: &str = r"(\d+)";

/// Metric key, stat name as it appears in the dump, and the capture it expects.
pub const METRIC_PATTERNS: &[(&str, &str, &str)] = &[
    ("sim_seconds", r"sim_seconds", FLOAT),
    ("sim_insts", r"sim_insts", INT),
    ("host_inst_rate", r"host_inst_rate", FLOAT),
    ("committedInsts", r"system\.cpu\.committedInsts", INT),
    ("numCycles", r"system\.cpu\.numCycles", INT),
    ("ipc", r"system\.cpu\.ipc", FLOAT),
    ("branch_lookups", r"system\.cpu\.branchPred\.lookups", INT),
    ("branch_condPredicted", r"system\.cpu\.branchPred\.condPredicted", INT),
    ("branch_condIncorrect", r"system\.cpu\.branchPred\.condIncorrect", INT),
    ("icache_overall_hits", r"system\.cpu\.icache\.overall_hits::total", INT),
    ("icache_overall_misses", r"system\.cpu\.icache\.overall_misses::total", INT),
    ("dcache_overall_hits", r"system\.cpu\.dcache\.overall_hits::total", INT),
    ("dcache_overall_misses", r"system\.cpu\.dcache\.overall_misses::total", INT),
    ("l2cache_overall_hits", r"system\.l2cache\.overall_hits::total", INT),
    ("l2cache_overall_misses", r"system\.l2cache\.overall_misses::total", INT),
    ("fetch_rate", r"system\.cpu\.fetch\.rate", FLOAT),
    ("decode_rate", r"system\.cpu\.decode\.rate", FLOAT),
    ("commit_rate", r"system\.cpu\.commit\.rate", FLOAT),
];

// (hits, misses, derived hit rate)
const CACHES: [(&str, &str, &str); 3] = [
    ("icache_overall_hits", "icache_overall_misses", "icache_hit_rate"),
    ("dcache_overall_hits", "dcache_overall_misses", "dcache_hit_rate"),
    ("l2cache_overall_hits", "l2cache_overall_misses", "l2cache_hit_rate"),
];

#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Int(i64),
    Float(f64),
    Text(String),
}

impl Value {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Value::Int(i) => Some(*i as f64),
            Value::Float(f) => Some(*f),
            Value::Text(_) => None,
        }
    }

    /// Anything that looks like a float is parsed as one; unparseable text is kept verbatim.
    /// Integers too large for `i64` become floats.
    pub fn coerce(s: &str) -> Self {
        let looks_float = s.contains('.') || s.contains('e') || s.contains('E');
        let int = (!looks_float)
            .then(|| s.parse::<i64>().ok())
            .flatten()
            .map(Value::Int);
        int.or_else(|| s.parse::<f64>().ok().map(Value::Float))
            .unwrap_or_else(|| Value::Text(s.to_owned()))
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Int(i) => write!(f, "{i}"),
            Value::Float(x) => write!(f, "{x}"),
            Value::Text(s) => f.write_str(s),
        }
    }
}

/// Compiled form of [`METRIC_PATTERNS`].
#[derive(Debug)]
pub struct Extractor {
    patterns: Vec<(&'static str, Regex)>,
}

impl Extractor {
    pub fn new() -> Self {
        let patterns = METRIC_PATTERNS
            .iter()
            .map(|(key, name, capture)| {
                let re = Regex::new(&format!(r"{name}\s+{capture}"))
                    .unwrap_or_else(|e| panic!("bad pattern for {key}: {e}"));
                (*key, re)
            })
            .collect();
        Self { patterns }
    }

    /// Shared instance; the pattern table is fixed so it is compiled once.
    pub fn global() -> &'static Extractor {
        static EXTRACTOR: OnceLock<Extractor> = OnceLock::new();
        EXTRACTOR.get_or_init(Extractor::new)
    }

    pub fn extract(&self, contents: &str) -> Stats {
        let mut metrics = HashMap::new();
        for (key, re) in &self.patterns {
            if let Some(m) = re.captures(contents).and_then(|c| c.get(1)) {
                metrics.insert(*key, Value::coerce(m.as_str()));
            }
        }

        let mut stats = Stats { metrics };
        stats.derive();
        stats
    }
}

impl Default for Extractor {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Stats {
    metrics: HashMap<&'static str, Value>,
}

impl FromStr for Stats {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(Extractor::global().extract(s))
    }
}

impl Stats {
    /// Reads and parses a stats dump. A missing file gives empty stats.
    pub fn from_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            warn!(path = %path.display(), "stats file not found");
            return Ok(Self::default());
        }
        let contents = std::fs::read_to_string(path).map_err(|e| Error::io(path, e))?;
        Ok(Extractor::global().extract(&contents))
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.metrics.get(key)
    }

    pub fn get_f64(&self, key: &str) -> Option<f64> {
        self.get(key).and_then(Value::as_f64)
    }

    pub fn get_or_zero(&self, key: &str) -> f64 {
        self.get_f64(key).unwrap_or(0.0)
    }

    pub fn is_empty(&self) -> bool {
        self.metrics.is_empty()
    }

    pub fn len(&self) -> usize {
        self.metrics.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&'static str, &Value)> {
        self.metrics.iter().map(|(k, v)| (*k, v))
    }

    fn derive(&mut self) {
        if let (Some(predicted), Some(incorrect)) = (
            self.get_f64("branch_condPredicted"),
            self.get_f64("branch_condIncorrect"),
        ) {
            let acc = if predicted > 0.0 {
                1.0 - incorrect / predicted
            } else {
                0.0
            };
            self.metrics.insert("branch_accuracy", Value::Float(acc));
        }

        for (hits, misses, rate) in CACHES {
            if let (Some(h), Some(m)) = (self.get_f64(hits), self.get_f64(misses)) {
                let total = h + m;
                let r = if total > 0.0 { h / total } else { 0.0 };
                self.metrics.insert(rate, Value::Float(r));
            }
        }

        // Some CPU models do not dump ipc directly.
        if self.get("ipc").is_none() {
            if let (Some(insts), Some(cycles)) =
                (self.get_f64("committedInsts"), self.get_f64("numCycles"))
            {
                if cycles > 0.0 {
                    self.metrics.insert("ipc", Value::Float(insts / cycles));
                }
            }
        }
    }
}
