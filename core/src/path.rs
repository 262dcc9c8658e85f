//! Planner integration. A host calls [`initialize`] once at load time; from then on every base
//! relation the planner visits is offered a [`CustomPath`] when it has a lexscan index and the scan
//! is enabled. The chosen path turns into a [`CustomScanPlan`], and the executor creates the scan
//! state through the [`CustomScanMethods`] registered under [`SCAN_NAME`].

use crate::catalog::{Catalog, IndexRelation, Oid, RelKind, Relation};
use crate::chooser::choose_index;
use crate::config::ScanConfig;
use crate::node::CustomExecMethods;
use crate::scan::LexScanState;
use crate::SCAN_NAME;
use indexmap::{IndexMap, IndexSet};
use lexql::ast::Predicate;
use std::rc::Rc;
use tracing::{debug, trace};

#[derive(Debug, Clone, PartialEq)]
pub struct RangeTableEntry {
    pub relid: Oid,
    /// Whether the scan also covers inheritance children
    pub inh: bool,
}

/// A restriction clause attached to a relation
#[derive(Debug, Clone, PartialEq)]
pub struct RestrictInfo {
    pub clause: Predicate,
    /// Mentions no column of the relation, so it is checked once by the host rather than per row
    pub pseudoconstant: bool,
}

impl RestrictInfo {
    pub fn new(clause: Predicate) -> Self { Self { clause, pseudoconstant: false } }
}

/// Planner view of one base relation
pub struct RelOptInfo {
    pub relid: Oid,
    /// Columns the rest of the plan needs from this relation
    pub reltarget: Vec<String>,
    pub baserestrictinfo: Vec<RestrictInfo>,
    pub pathlist: Vec<Path>,
}

impl RelOptInfo {
    pub fn new(relid: Oid, reltarget: Vec<String>, baserestrictinfo: Vec<RestrictInfo>) -> Self {
        Self { relid, reltarget, baserestrictinfo, pathlist: vec![Path::SeqScan { relid }] }
    }

    pub fn add_path(&mut self, path: Path) { self.pathlist.push(path) }

    pub fn custom_paths(&self) -> impl Iterator<Item = &CustomPath> {
        self.pathlist.iter().filter_map(|path| match path {
            Path::Custom(custom) => Some(custom),
            _ => None,
        })
    }
}

pub enum Path {
    SeqScan { relid: Oid },
    Custom(CustomPath),
}

pub struct CustomPath {
    pub relid: Oid,
    /// The index the scan will read
    pub index: Oid,
    /// Provider-private data carried from path to plan
    pub private: Vec<Oid>,
    pub methods: Rc<dyn CustomPathMethods>,
}

pub struct PlannerInfo<'a> {
    pub catalog: &'a dyn Catalog,
    pub config: &'a ScanConfig,
}

pub trait CustomPathMethods {
    fn name(&self) -> &str;
    fn plan_custom_path(&self, rel: &RelOptInfo, path: &CustomPath, tlist: &[String], clauses: &[RestrictInfo]) -> CustomScanPlan;
    /// Private data of `path` translated for a child of a partitioned relation
    fn reparameterize_by_child(&self, root: &PlannerInfo, private: &[Oid], child: &RelOptInfo) -> Vec<Oid>;
}

pub trait CustomScanMethods {
    fn name(&self) -> &str;
    fn create_custom_scan_state(&self, plan: &CustomScanPlan) -> Box<dyn CustomExecMethods>;
}

/// The plan node a custom path turns into
#[derive(Debug, Clone, PartialEq)]
pub struct CustomScanPlan {
    pub relid: Oid,
    pub index: Oid,
    pub targetlist: Vec<String>,
    /// Restrictions to check per row; pseudoconstant clauses are left out
    pub qual: Vec<Predicate>,
    /// Target list columns followed by any other column `qual` references
    pub scan_columns: Vec<String>,
    /// Name of the registered [`CustomScanMethods`] that executes the plan
    pub methods: String,
}

pub type SetRelPathlistHook = Rc<dyn Fn(&PlannerInfo, &mut RelOptInfo, &RangeTableEntry)>;

pub fn pathlist_hook<F>(hook: F) -> SetRelPathlistHook
where F: Fn(&PlannerInfo, &mut RelOptInfo, &RangeTableEntry) + 'static {
    Rc::new(hook)
}

/// The host's hook points: the relation path-list hook and the registry of custom scan providers
#[derive(Default)]
pub struct Hooks {
    set_rel_pathlist: Option<SetRelPathlistHook>,
    custom_scan_methods: IndexMap<String, Rc<dyn CustomScanMethods>>,
}

impl Hooks {
    pub fn new() -> Self { Self::default() }

    pub fn set_rel_pathlist_hook(&self) -> Option<&SetRelPathlistHook> { self.set_rel_pathlist.as_ref() }

    pub fn install_set_rel_pathlist_hook(&mut self, hook: Option<SetRelPathlistHook>) -> Option<SetRelPathlistHook> {
        std::mem::replace(&mut self.set_rel_pathlist, hook)
    }

    /// Run the installed path-list hook, if any, for one relation
    pub fn set_rel_pathlist(&self, root: &PlannerInfo, rel: &mut RelOptInfo, rte: &RangeTableEntry) {
        if let Some(hook) = &self.set_rel_pathlist {
            hook(root, rel, rte);
        }
    }

    pub fn register_custom_scan_methods(&mut self, methods: Rc<dyn CustomScanMethods>) {
        self.custom_scan_methods.insert(methods.name().to_string(), methods);
    }

    pub fn unregister_custom_scan_methods(&mut self, name: &str) -> Option<Rc<dyn CustomScanMethods>> {
        self.custom_scan_methods.shift_remove(name)
    }

    pub fn custom_scan_methods(&self, name: &str) -> Option<Rc<dyn CustomScanMethods>> { self.custom_scan_methods.get(name).cloned() }
}

/// What [`initialize`] replaced, handed back to [`finalize`]
pub struct Registration {
    previous: Option<SetRelPathlistHook>,
}

/// Install the path-list hook, chained after whatever hook was installed before, and register the
/// scan methods.
pub fn initialize(hooks: &mut Hooks) -> Registration {
    let previous = hooks.set_rel_pathlist_hook().cloned();
    let chained = previous.clone();
    hooks.install_set_rel_pathlist_hook(Some(pathlist_hook(move |root, rel, rte| {
        if let Some(previous) = &chained {
            previous(root, rel, rte);
        }
        offer_path(root, rel, rte);
    })));
    hooks.register_custom_scan_methods(Rc::new(LexScanMethods));
    debug!("[path] {SCAN_NAME} registered");
    Registration { previous }
}

/// Restore the hook [`initialize`] replaced and withdraw the scan methods
pub fn finalize(hooks: &mut Hooks, registration: Registration) {
    hooks.install_set_rel_pathlist_hook(registration.previous);
    hooks.unregister_custom_scan_methods(SCAN_NAME);
    debug!("[path] {SCAN_NAME} unregistered");
}

/// Add a lexscan path to `rel` when the scan is enabled and `rte` is a plain table with a lexscan index
pub fn offer_path(root: &PlannerInfo, rel: &mut RelOptInfo, rte: &RangeTableEntry) {
    if !root.config.is_enabled() {
        return;
    }
    let Some(relation) = root.catalog.relation(rte.relid) else {
        trace!("[path] relation {} is not in the catalog", rte.relid);
        return;
    };
    if relation.kind != RelKind::Relation {
        trace!("[path] {}: {:?} is not scanned", relation.name, relation.kind);
        return;
    }
    let Some(index) = choose_index(root.catalog, relation) else {
        return;
    };
    if let Some(name) = uncovered_column(rel, relation, index) {
        debug!("[path] {}: {name} is not stored in {}, leaving the scan to the host", relation.name, index.name);
        return;
    }
    debug!("[path] {}: offering {SCAN_NAME} over {}", relation.name, index.name);
    let path = CustomPath { relid: rel.relid, index: index.oid, private: Vec::new(), methods: Rc::new(LexScanPathMethods) };
    rel.add_path(Path::Custom(path));
}

/// First column the scan would have to produce or recheck that `index` does not store
fn uncovered_column<'a>(rel: &'a RelOptInfo, relation: &Relation, index: &IndexRelation) -> Option<&'a str> {
    let restrictions = rel.baserestrictinfo.iter().filter(|info| !info.pseudoconstant).flat_map(|info| info.clause.identifiers());
    rel.reltarget
        .iter()
        .map(String::as_str)
        .chain(restrictions.map(|id| id.name()))
        .find(|name| !relation.attribute(name).is_some_and(|(attribute, _)| index.key_position(attribute).is_some()))
}

pub struct LexScanPathMethods;

impl CustomPathMethods for LexScanPathMethods {
    fn name(&self) -> &str { SCAN_NAME }

    fn plan_custom_path(&self, rel: &RelOptInfo, path: &CustomPath, tlist: &[String], clauses: &[RestrictInfo]) -> CustomScanPlan {
        let qual: Vec<Predicate> = clauses.iter().filter(|info| !info.pseudoconstant).map(|info| info.clause.clone()).collect();
        let mut scan_columns: IndexSet<String> = tlist.iter().cloned().collect();
        for predicate in &qual {
            scan_columns.extend(predicate.identifiers().into_iter().map(|id| id.name().to_string()));
        }
        CustomScanPlan {
            relid: rel.relid,
            index: path.index,
            targetlist: tlist.to_vec(),
            qual,
            scan_columns: scan_columns.into_iter().collect(),
            methods: SCAN_NAME.to_string(),
        }
    }

    fn reparameterize_by_child(&self, _root: &PlannerInfo, _private: &[Oid], _child: &RelOptInfo) -> Vec<Oid> { Vec::new() }
}

pub struct LexScanMethods;

impl CustomScanMethods for LexScanMethods {
    fn name(&self) -> &str { SCAN_NAME }

    fn create_custom_scan_state(&self, plan: &CustomScanPlan) -> Box<dyn CustomExecMethods> { Box::new(LexScanState::new(plan)) }
}
