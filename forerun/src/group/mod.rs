//! Ordered, reusable groups of pre-processing units.
//!
//! A [`Group`] holds a sequence of units that run, one after another, before a
//! main handler. [`Group::and`] binds the group to a main handler and yields a
//! single [`GroupHandler`] that can be served directly.
//!
//! Composed handlers always run the group's *current* units: appending to a
//! group after calling [`Group::and`] is visible to handlers produced earlier.
//! Whether a handler logs is decided when it is composed.
//!
//! Groups are usually built during start-up, but mutating one while its
//! handlers serve traffic is safe. Every invocation runs against a consistent
//! snapshot of the sequence; a mutation lands between invocations, never in
//! the middle of one.

mod diagnostics;
mod units;

use std::{
    fmt,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    time::Instant,
};

use async_trait::async_trait;
use forerun_core::{request::Request, response::Response};
use parking_lot::RwLock;

pub use self::{
    diagnostics::{Diagnostics, Event, TracingDiagnostics},
    units::IntoUnits,
};
use crate::{config::group::GroupsConfig, handler::Handler, middleware::Middleware};

type Snapshot = Arc<[Arc<dyn Handler>]>;

pub struct Group {
    name: Arc<str>,
    units: Arc<RwLock<Snapshot>>,
    logging: AtomicBool,
    diagnostics: Arc<dyn Diagnostics>,
}

impl Group {
    /// Creates an empty group with logging disabled.
    pub fn new<N: Into<Arc<str>>>(name: N) -> Self {
        Self {
            name: name.into(),
            units: Arc::new(RwLock::new(Arc::from(Vec::new()))),
            logging: AtomicBool::new(false),
            diagnostics: Arc::new(TracingDiagnostics),
        }
    }

    /// Replaces the sink that receives this group's diagnostics, by default
    /// [`TracingDiagnostics`].
    pub fn with_diagnostics<D: Diagnostics>(mut self, diagnostics: D) -> Self {
        self.diagnostics = Arc::new(diagnostics);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn len(&self) -> usize {
        self.units.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The units as they are right now.
    pub fn units(&self) -> Arc<[Arc<dyn Handler>]> {
        self.units.read().clone()
    }

    pub fn is_logging(&self) -> bool {
        self.logging.load(Ordering::Acquire)
    }

    /// Only handlers composed after this call pick up the new value.
    pub fn set_logging(&self, enabled: bool) {
        self.logging.store(enabled, Ordering::Release);
    }

    /// Applies the entry named after this group, if any.
    pub fn apply_config(&self, config: &GroupsConfig) {
        if let Some(cfg) = config.get(&self.name) {
            self.set_logging(cfg.logging);
        }
    }

    pub fn append<U: IntoUnits>(&self, units: U) {
        let units = units.into_units();

        if units.is_empty() {
            return;
        }

        let mut current = self.units.write();

        *current = current.iter().cloned().chain(units).collect();
    }

    /// Inserts `units` at the front, keeping their relative order.
    pub fn prepend<U: IntoUnits>(&self, units: U) {
        let units = units.into_units();

        if units.is_empty() {
            return;
        }

        let mut current = self.units.write();

        *current = units.into_iter().chain(current.iter().cloned()).collect();
    }

    /// Appends a copy of `other`'s current units. Later changes to `other` are
    /// not carried over.
    pub fn extend(&self, other: &Group) {
        let snapshot = other.units();
        self.append(snapshot.to_vec());
    }

    /// Binds the group to `main`. The group is left untouched and can be
    /// bound to any number of other handlers.
    pub fn and<H: Handler>(&self, main: H) -> GroupHandler<H> {
        let diagnostics = self.is_logging().then(|| self.diagnostics.clone());

        GroupHandler {
            name: self.name.clone(),
            units: self.units.clone(),
            main,
            diagnostics,
        }
    }
}

impl fmt::Debug for Group {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Group")
            .field("name", &self.name)
            .field("units", &self.len())
            .field("logging", &self.is_logging())
            .finish()
    }
}

impl<H: Handler> Middleware<H> for &Group {
    type Output = GroupHandler<H>;

    fn transform(self, input: H) -> Self::Output {
        self.and(input)
    }
}

pub struct GroupHandler<H> {
    name: Arc<str>,
    units: Arc<RwLock<Snapshot>>,
    main: H,
    diagnostics: Option<Arc<dyn Diagnostics>>,
}

impl<H> GroupHandler<H> {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_logging(&self) -> bool {
        self.diagnostics.is_some()
    }
}

impl<H: Handler> GroupHandler<H> {
    async fn call_logged(
        &self,
        diagnostics: &dyn Diagnostics,
        units: &[Arc<dyn Handler>],
        res: &mut Response,
        req: &mut Request,
    ) {
        let group = &*self.name;
        let start = Instant::now();

        diagnostics.record(&Event::UnitsStarted {
            group,
            units: units.len(),
        });

        for (index, unit) in units.iter().enumerate() {
            diagnostics.record(&Event::UnitStarted { group, index });

            let unit_start = Instant::now();
            unit.call(res, req).await;

            diagnostics.record(&Event::UnitCompleted {
                group,
                index,
                elapsed: unit_start.elapsed(),
            });
        }

        diagnostics.record(&Event::UnitsCompleted {
            group,
            elapsed: start.elapsed(),
        });

        diagnostics.record(&Event::MainStarted { group });
        self.main.call(res, req).await;

        diagnostics.record(&Event::ChainCompleted {
            group,
            elapsed: start.elapsed(),
        });
    }
}

#[async_trait]
impl<H: Handler> Handler for GroupHandler<H> {
    async fn call(&self, res: &mut Response, req: &mut Request) {
        let units = self.units.read().clone();

        if let Some(diagnostics) = &self.diagnostics {
            return self
                .call_logged(diagnostics.as_ref(), &units, res, req)
                .await;
        }

        for unit in units.iter() {
            unit.call(res, req).await;
        }

        self.main.call(res, req).await;
    }
}
