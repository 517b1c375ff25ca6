//! Label-partitioned instruments.
//!
//! Each instrument keeps a fixed, ordered list of label names and a `DashMap`
//! from label-value tuples to an atomic cell. Increments touch a single shard
//! entry; collection loads each atomic once, so a scrape never sees a torn
//! value. Handles are `Clone` and share storage, which lets the same counter be
//! registered once and incremented from anywhere.

use std::borrow::Borrow;
use std::hash::{Hash, Hasher};
use std::sync::atomic::{AtomicI64, AtomicU64, Ordering};
use std::sync::Arc;

use dashmap::DashMap;

use crate::error::{Result, TallyError};
use crate::metric::{validate_label_name, MetricDesc, MetricFamily, MetricKind, Sample, Value};

/// Anything the registry can hold and collect.
pub trait Instrument: Send + Sync {
    fn desc(&self) -> &MetricDesc;
    fn collect(&self) -> MetricFamily;
}

/// Label values viewed either as owned map keys or as caller-borrowed `&str`s.
///
/// Lets hot-path lookups hash and compare `&[&str]` against stored keys
/// without allocating.
trait LabelView {
    fn len(&self) -> usize;
    fn part(&self, i: usize) -> Option<&str>;
}

impl Hash for dyn LabelView + '_ {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.len().hash(state);
        for i in 0..self.len() {
            self.part(i).hash(state);
        }
    }
}

impl PartialEq for dyn LabelView + '_ {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len() && (0..self.len()).all(|i| self.part(i) == other.part(i))
    }
}

impl Eq for dyn LabelView + '_ {}

/// Owned label values stored in the instrument map.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
struct LabelKey(Vec<String>);

impl LabelView for LabelKey {
    fn len(&self) -> usize {
        self.0.len()
    }
    fn part(&self, i: usize) -> Option<&str> {
        self.0.get(i).map(String::as_str)
    }
}

impl Hash for LabelKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        (self as &dyn LabelView).hash(state);
    }
}

impl<'a> Borrow<dyn LabelView + 'a> for LabelKey {
    fn borrow(&self) -> &(dyn LabelView + 'a) {
        self
    }
}

struct Borrowed<'a>(&'a [&'a str]);

impl LabelView for Borrowed<'_> {
    fn len(&self) -> usize {
        self.0.len()
    }
    fn part(&self, i: usize) -> Option<&str> {
        self.0.get(i).copied()
    }
}

/// Name, help and label schema shared by both instrument kinds.
#[derive(Debug)]
struct Schema {
    desc: MetricDesc,
    label_names: Vec<String>,
}

impl Schema {
    fn new(name: &str, help: &str, kind: MetricKind, label_names: &[&str]) -> Result<Self> {
        let desc = MetricDesc::new(name, help, kind)?;
        let mut names: Vec<String> = Vec::with_capacity(label_names.len());
        for l in label_names {
            validate_label_name(l)?;
            if names.iter().any(|n| n == l) {
                return Err(TallyError::InvalidName(format!(
                    "label {l:?} repeated on metric {name}"
                )));
            }
            names.push((*l).to_string());
        }
        Ok(Self {
            desc,
            label_names: names,
        })
    }

    fn check_arity(&self, values: &[&str]) -> Result<()> {
        if values.len() != self.label_names.len() {
            return Err(TallyError::LabelMismatch {
                metric: self.desc.name.clone(),
                expected: self.label_names.len(),
                got: values.len(),
            });
        }
        Ok(())
    }

    fn key(&self, values: &[&str]) -> Result<LabelKey> {
        self.check_arity(values)?;
        Ok(LabelKey(values.iter().map(|v| v.to_string()).collect()))
    }

    fn labels(&self, key: &[String]) -> Vec<(String, String)> {
        self.label_names
            .iter()
            .cloned()
            .zip(key.iter().cloned())
            .collect()
    }
}

/// Counters never wrap: a full cell stays at `u64::MAX`.
fn saturating_add(cell: &AtomicU64, v: u64) {
    let _ = cell.fetch_update(Ordering::Relaxed, Ordering::Relaxed, |cur| {
        Some(cur.saturating_add(v))
    });
}

/// Collect entries sorted by label values so output is stable between scrapes.
fn sorted_samples<A, F>(schema: &Schema, map: &DashMap<LabelKey, A>, load: F) -> Vec<Sample>
where
    F: Fn(&A) -> Value,
{
    let mut rows: Vec<(LabelKey, Value)> = map
        .iter()
        .map(|r| (r.key().clone(), load(r.value())))
        .collect();
    rows.sort_by(|a, b| a.0.cmp(&b.0));
    rows.into_iter()
        .map(|(key, value)| Sample {
            labels: schema.labels(&key.0),
            value,
        })
        .collect()
}

struct CounterInner {
    schema: Schema,
    map: DashMap<LabelKey, AtomicU64>,
}

/// Monotonic `u64` counter partitioned by label values.
#[derive(Clone)]
pub struct CounterVec {
    inner: Arc<CounterInner>,
}

impl CounterVec {
    pub fn new(name: &str, help: &str, label_names: &[&str]) -> Result<Self> {
        let schema = Schema::new(name, help, MetricKind::Counter, label_names)?;
        let map = DashMap::new();
        // An unlabeled counter is exposed as 0 before its first increment.
        if schema.label_names.is_empty() {
            map.insert(LabelKey(Vec::new()), AtomicU64::new(0));
        }
        Ok(Self {
            inner: Arc::new(CounterInner { schema, map }),
        })
    }

    /// Increment by 1.
    pub fn inc(&self, values: &[&str]) -> Result<()> {
        self.inc_by(values, 1)
    }

    /// Increment by an arbitrary amount. Saturates at `u64::MAX`.
    pub fn inc_by(&self, values: &[&str], v: u64) -> Result<()> {
        self.inner.schema.check_arity(values)?;
        // Existing series: look up by borrowed values, no key allocation.
        if let Some(counter) = self.inner.map.get(&Borrowed(values) as &dyn LabelView) {
            saturating_add(counter.value(), v);
            return Ok(());
        }
        let key = self.inner.schema.key(values)?;
        let counter = self
            .inner
            .map
            .entry(key)
            .or_insert_with(|| AtomicU64::new(0));
        saturating_add(counter.value(), v);
        Ok(())
    }

    /// Current value for one label combination, if it was ever touched.
    pub fn get(&self, values: &[&str]) -> Option<u64> {
        self.inner.schema.check_arity(values).ok()?;
        self.inner
            .map
            .get(&Borrowed(values) as &dyn LabelView)
            .map(|c| c.value().load(Ordering::Relaxed))
    }

    pub fn label_names(&self) -> &[String] {
        &self.inner.schema.label_names
    }
}

impl Instrument for CounterVec {
    fn desc(&self) -> &MetricDesc {
        &self.inner.schema.desc
    }

    fn collect(&self) -> MetricFamily {
        let samples = sorted_samples(&self.inner.schema, &self.inner.map, |c| {
            Value::Unsigned(c.load(Ordering::Relaxed))
        });
        MetricFamily::from_desc(&self.inner.schema.desc, samples)
    }
}

struct GaugeInner {
    schema: Schema,
    map: DashMap<LabelKey, AtomicI64>,
}

/// Signed gauge partitioned by label values.
#[derive(Clone)]
pub struct GaugeVec {
    inner: Arc<GaugeInner>,
}

impl GaugeVec {
    pub fn new(name: &str, help: &str, label_names: &[&str]) -> Result<Self> {
        let schema = Schema::new(name, help, MetricKind::Gauge, label_names)?;
        let map = DashMap::new();
        if schema.label_names.is_empty() {
            map.insert(LabelKey(Vec::new()), AtomicI64::new(0));
        }
        Ok(Self {
            inner: Arc::new(GaugeInner { schema, map }),
        })
    }

    /// Increment by 1.
    pub fn inc(&self, values: &[&str]) -> Result<()> {
        self.add(values, 1)
    }

    /// Decrement by 1.
    pub fn dec(&self, values: &[&str]) -> Result<()> {
        self.add(values, -1)
    }

    /// Add an arbitrary signed delta.
    pub fn add(&self, values: &[&str], v: i64) -> Result<()> {
        self.inner.schema.check_arity(values)?;
        if let Some(gauge) = self.inner.map.get(&Borrowed(values) as &dyn LabelView) {
            gauge.fetch_add(v, Ordering::Relaxed);
            return Ok(());
        }
        let key = self.inner.schema.key(values)?;
        let gauge = self
            .inner
            .map
            .entry(key)
            .or_insert_with(|| AtomicI64::new(0));
        gauge.fetch_add(v, Ordering::Relaxed);
        Ok(())
    }

    /// Overwrite the value.
    pub fn set(&self, values: &[&str], v: i64) -> Result<()> {
        let key = self.inner.schema.key(values)?;
        let gauge = self
            .inner
            .map
            .entry(key)
            .or_insert_with(|| AtomicI64::new(0));
        gauge.store(v, Ordering::Relaxed);
        Ok(())
    }

    pub fn get(&self, values: &[&str]) -> Option<i64> {
        self.inner.schema.check_arity(values).ok()?;
        self.inner
            .map
            .get(&Borrowed(values) as &dyn LabelView)
            .map(|g| g.value().load(Ordering::Relaxed))
    }
}

impl Instrument for GaugeVec {
    fn desc(&self) -> &MetricDesc {
        &self.inner.schema.desc
    }

    fn collect(&self) -> MetricFamily {
        let samples = sorted_samples(&self.inner.schema, &self.inner.map, |g| {
            Value::Signed(g.load(Ordering::Relaxed))
        });
        MetricFamily::from_desc(&self.inner.schema.desc, samples)
    }
}
