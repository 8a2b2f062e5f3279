//! Pre-elaborated design descriptions.
//!
//! A [`Design`] is what the kernel simulates: a populated [`SignalStore`],
//! the name [`Registry`], the ACT-region trigger list, and ordered logic
//! blocks written as Rust closures. Designs are assembled with
//! [`DesignBuilder`]:
//!
//! ```
//! use regsim_kernel::{DesignBuilder, SimKernel, KernelConfig};
//!
//! let mut b = DesignBuilder::new("toggle");
//! let clk = b.input("clk", 1)?;
//! let q = b.output("q", 1)?;
//! let on_clk = b.posedge(clk.inner);
//! b.sequential("flip", &[on_clk], move |ctx| {
//!     let next = ctx.get(q.inner) ^ 1;
//!     ctx.stage(q.inner, next)
//! });
//! let mut kernel = SimKernel::new(b.build()?, KernelConfig::default())?;
//! kernel.write_by_name("TOP.clk", 1)?;
//! kernel.step()?;
//! assert_eq!(kernel.read_by_name("TOP.q")?, 1);
//! # Ok::<(), regsim_kernel::SimError>(())
//! ```

use crate::error::SimError;
use crate::nba::{DelayedWriteBuffer, WriteTarget};
use crate::region::Region;
use crate::registry::{Access, Direction, Handle, Registry, VarEntry, Visibility, TOP_SCOPE};
use crate::trigger::{Trigger, TriggerEvaluator, TriggerId, TriggerKind, TriggerSet};
use crate::value::{MemoryId, SignalId, SignalStore};

/// Body of a logic block.
pub type BlockFn = Box<dyn Fn(&mut BlockContext<'_>) -> Result<(), SimError>>;

/// How a block is scheduled.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BlockKind {
    /// Runs in the ICO region after inputs are copied in.
    InputCombinational,
    /// Runs in the ACT region whenever one of its triggers is active.
    Combinational,
    /// Runs in the ACT region when one of its triggers is freshly active;
    /// its register updates are staged and land at NBA commit.
    Sequential,
}

pub(crate) struct Block {
    pub(crate) name: String,
    pub(crate) kind: BlockKind,
    pub(crate) sensitivity: TriggerSet,
    pub(crate) body: BlockFn,
}

/// A top-level port and its module-scope mirror.
///
/// Input ports are copied `top → inner` by the ICO region; output ports are
/// copied `inner → top` after every region pass. Design logic reads and
/// writes only `inner`.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Port {
    /// The `TOP.<name>` signal driven or observed by the harness.
    pub top: SignalId,
    /// The `<module>.<name>` signal used by design logic.
    pub inner: SignalId,
}

/// The view of simulation state handed to a running block.
pub struct BlockContext<'a> {
    store: &'a mut SignalStore,
    nba: &'a mut DelayedWriteBuffer,
}

impl<'a> BlockContext<'a> {
    pub(crate) fn new(store: &'a mut SignalStore, nba: &'a mut DelayedWriteBuffer) -> Self {
        Self { store, nba }
    }

    /// Reads the current value of a signal.
    pub fn get(&self, id: SignalId) -> u64 {
        self.store.read(id)
    }

    /// Blocking assignment: the new value is visible immediately.
    pub fn set(&mut self, id: SignalId, value: u64) -> Result<(), SimError> {
        self.store.write(id, value)
    }

    /// Reads one word of a memory.
    pub fn word(&self, mem: MemoryId, index: u32) -> Result<u64, SimError> {
        self.store.read_word(mem, index)
    }

    /// Non-blocking assignment to a signal, applied at NBA commit.
    pub fn stage(&mut self, id: SignalId, value: u64) -> Result<(), SimError> {
        self.nba.stage(self.store, WriteTarget::Signal(id), value)
    }

    /// Non-blocking assignment to a memory word, applied at NBA commit.
    pub fn stage_word(&mut self, mem: MemoryId, index: u32, value: u64) -> Result<(), SimError> {
        self.nba
            .stage(self.store, WriteTarget::Word { mem, index }, value)
    }
}

/// A complete, immutable design ready for simulation.
pub struct Design {
    pub(crate) name: String,
    pub(crate) store: SignalStore,
    pub(crate) registry: Registry,
    pub(crate) ico: TriggerEvaluator,
    pub(crate) stl: TriggerEvaluator,
    pub(crate) act: TriggerEvaluator,
    pub(crate) ico_blocks: Vec<Block>,
    pub(crate) act_blocks: Vec<Block>,
    pub(crate) inputs: Vec<Port>,
    pub(crate) outputs: Vec<Port>,
}

impl Design {
    /// The module name, which is also the internal scope name.
    pub fn name(&self) -> &str {
        &self.name
    }

    /// The name registry.
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// The signal store in its initial state.
    pub fn store(&self) -> &SignalStore {
        &self.store
    }

    /// The ACT-region trigger list.
    pub fn act_triggers(&self) -> &[Trigger] {
        self.act.triggers()
    }

    /// Number of logic blocks across all regions.
    pub fn block_count(&self) -> usize {
        self.ico_blocks.len() + self.act_blocks.len()
    }

    /// Names of the logic blocks of `kind`, in evaluation order.
    pub fn block_names(&self, kind: BlockKind) -> Vec<&str> {
        self.ico_blocks
            .iter()
            .chain(&self.act_blocks)
            .filter(|b| b.kind == kind)
            .map(|b| b.name.as_str())
            .collect()
    }

    pub(crate) fn copy_inputs(&mut self) -> Result<(), SimError> {
        for port in &self.inputs {
            let v = self.store.read(port.top);
            self.store.write(port.inner, v)?;
        }
        Ok(())
    }

    pub(crate) fn copy_outputs(&mut self) -> Result<(), SimError> {
        for port in &self.outputs {
            let v = self.store.read(port.inner);
            self.store.write(port.top, v)?;
        }
        Ok(())
    }
}

struct PendingBlock {
    name: String,
    kind: BlockKind,
    triggers: Vec<TriggerId>,
    body: BlockFn,
}

/// Incrementally assembles a [`Design`].
///
/// Declarations register their names immediately; logic blocks keep their
/// insertion order, which is also their evaluation order within a region.
pub struct DesignBuilder {
    module: String,
    store: SignalStore,
    registry: Registry,
    triggers: Vec<Trigger>,
    blocks: Vec<PendingBlock>,
    inputs: Vec<Port>,
    outputs: Vec<Port>,
}

impl DesignBuilder {
    /// Starts a design whose internal scope is `module`.
    pub fn new(module: impl Into<String>) -> Self {
        Self {
            module: module.into(),
            store: SignalStore::new(),
            registry: Registry::new(),
            triggers: Vec::new(),
            blocks: Vec::new(),
            inputs: Vec::new(),
            outputs: Vec::new(),
        }
    }

    /// Declares an input port.
    pub fn input(&mut self, name: &str, width: u32) -> Result<Port, SimError> {
        let port = self.port(name, width, Direction::Input)?;
        self.inputs.push(port);
        Ok(port)
    }

    /// Declares an output port.
    pub fn output(&mut self, name: &str, width: u32) -> Result<Port, SimError> {
        let port = self.port(name, width, Direction::Output)?;
        self.outputs.push(port);
        Ok(port)
    }

    /// Declares an internal register or wire, initialized to zero.
    pub fn signal(&mut self, name: &str, width: u32) -> Result<SignalId, SimError> {
        self.signal_with_init(name, width, 0)
    }

    /// Declares an internal register or wire with an initial value.
    pub fn signal_with_init(
        &mut self,
        name: &str,
        width: u32,
        init: u64,
    ) -> Result<SignalId, SimError> {
        let full = self.scoped(name);
        self.scalar(full, self.module.clone(), width, init, Direction::Internal, Visibility::Internal)
    }

    /// Declares a zero-initialized register array.
    pub fn memory(&mut self, name: &str, width: u32, depth: u32) -> Result<MemoryId, SimError> {
        let full = self.scoped(name);
        self.ensure_free(&full)?;
        let id = self.store.alloc_memory(full.clone(), width, depth)?;
        self.registry.insert(VarEntry {
            name: full,
            scope: self.module.clone(),
            handle: Handle::Memory(id),
            width,
            msb: width - 1,
            lsb: 0,
            depth: Some(depth),
            direction: Direction::Internal,
            visibility: Visibility::Internal,
            access: Access::ReadWrite,
        })?;
        Ok(id)
    }

    /// Registers a read-only constant such as a `localparam`.
    pub fn param(&mut self, name: &str, width: u32, value: u64) -> Result<(), SimError> {
        let full = self.scoped(name);
        self.ensure_free(&full)?;
        if width == 0 || width > crate::value::MAX_WIDTH {
            return Err(SimError::design(format!("'{full}' declares width {width}")));
        }
        if !crate::value::fits_width(value, width) {
            return Err(SimError::WidthViolation {
                name: full,
                width,
                value,
            });
        }
        self.registry.insert(VarEntry {
            name: full,
            scope: self.module.clone(),
            handle: Handle::Const(value),
            width,
            msb: width - 1,
            lsb: 0,
            depth: None,
            direction: Direction::Internal,
            visibility: Visibility::Internal,
            access: Access::ReadOnly,
        })
    }

    /// Adds an ACT-region trigger with an explicit description.
    pub fn trigger(&mut self, kind: TriggerKind, description: impl Into<String>) -> TriggerId {
        let id = TriggerId::from_raw(self.triggers.len() as u32);
        self.triggers.push(Trigger {
            kind,
            description: description.into(),
        });
        id
    }

    /// Adds `@(posedge sig)`.
    pub fn posedge(&mut self, sig: SignalId) -> TriggerId {
        let desc = format!("@(posedge {})", self.store.signal(sig).name);
        self.trigger(TriggerKind::Posedge(sig), desc)
    }

    /// Adds `@(negedge sig)`.
    pub fn negedge(&mut self, sig: SignalId) -> TriggerId {
        let desc = format!("@(negedge {})", self.store.signal(sig).name);
        self.trigger(TriggerKind::Negedge(sig), desc)
    }

    /// Adds `@(sig)` on either edge of the LSB.
    pub fn any_edge(&mut self, sig: SignalId) -> TriggerId {
        let desc = format!("@({})", self.store.signal(sig).name);
        self.trigger(TriggerKind::AnyEdge(sig), desc)
    }

    /// Adds a trigger on any change of `sig`.
    pub fn changed(&mut self, sig: SignalId) -> TriggerId {
        let desc = format!("@(changed {})", self.store.signal(sig).name);
        self.trigger(TriggerKind::Changed(sig), desc)
    }

    /// Adds the ACT-region first-iteration trigger.
    pub fn first_iteration(&mut self) -> TriggerId {
        self.trigger(
            TriggerKind::FirstIteration,
            "Internal 'act' trigger - first iteration",
        )
    }

    /// Adds an input-combinational block.
    pub fn input_combinational<F>(&mut self, name: &str, body: F) -> &mut Self
    where
        F: Fn(&mut BlockContext<'_>) -> Result<(), SimError> + 'static,
    {
        self.push_block(name, BlockKind::InputCombinational, &[], body)
    }

    /// Adds a combinational block sensitive to `triggers`.
    pub fn combinational<F>(&mut self, name: &str, triggers: &[TriggerId], body: F) -> &mut Self
    where
        F: Fn(&mut BlockContext<'_>) -> Result<(), SimError> + 'static,
    {
        self.push_block(name, BlockKind::Combinational, triggers, body)
    }

    /// Adds a sequential block sensitive to `triggers`.
    pub fn sequential<F>(&mut self, name: &str, triggers: &[TriggerId], body: F) -> &mut Self
    where
        F: Fn(&mut BlockContext<'_>) -> Result<(), SimError> + 'static,
    {
        self.push_block(name, BlockKind::Sequential, triggers, body)
    }

    /// Validates the description and produces the design.
    pub fn build(self) -> Result<Design, SimError> {
        let trigger_count = self.triggers.len();
        let mut ico_blocks = Vec::new();
        let mut act_blocks = Vec::new();
        for pending in self.blocks {
            let mut sensitivity = TriggerSet::new(trigger_count);
            for t in &pending.triggers {
                let index = t.as_raw() as usize;
                if index >= trigger_count {
                    return Err(SimError::design(format!(
                        "block '{}' references unknown trigger {index}",
                        pending.name
                    )));
                }
                sensitivity.set(index, true);
            }
            let block = Block {
                name: pending.name,
                kind: pending.kind,
                sensitivity,
                body: pending.body,
            };
            match block.kind {
                BlockKind::InputCombinational => ico_blocks.push(block),
                BlockKind::Combinational | BlockKind::Sequential => {
                    if !block.sensitivity.any() {
                        return Err(SimError::design(format!(
                            "block '{}' has an empty sensitivity list",
                            block.name
                        )));
                    }
                    act_blocks.push(block);
                }
            }
        }

        tracing::debug!(
            design = %self.module,
            signals = self.store.signal_count(),
            memories = self.store.memory_count(),
            triggers = trigger_count,
            blocks = ico_blocks.len() + act_blocks.len(),
            "design built"
        );

        Ok(Design {
            name: self.module,
            store: self.store,
            registry: self.registry,
            ico: TriggerEvaluator::first_iteration_only(Region::Ico.label()),
            stl: TriggerEvaluator::first_iteration_only(Region::Stl.label()),
            act: TriggerEvaluator::new(self.triggers),
            ico_blocks,
            act_blocks,
            inputs: self.inputs,
            outputs: self.outputs,
        })
    }

    fn push_block<F>(
        &mut self,
        name: &str,
        kind: BlockKind,
        triggers: &[TriggerId],
        body: F,
    ) -> &mut Self
    where
        F: Fn(&mut BlockContext<'_>) -> Result<(), SimError> + 'static,
    {
        self.blocks.push(PendingBlock {
            name: name.to_string(),
            kind,
            triggers: triggers.to_vec(),
            body: Box::new(body),
        });
        self
    }

    fn port(&mut self, name: &str, width: u32, direction: Direction) -> Result<Port, SimError> {
        let top = self.scalar(
            format!("{TOP_SCOPE}.{name}"),
            TOP_SCOPE.to_string(),
            width,
            0,
            direction,
            Visibility::Public,
        )?;
        let inner = self.signal(name, width)?;
        Ok(Port { top, inner })
    }

    fn scalar(
        &mut self,
        full: String,
        scope: String,
        width: u32,
        init: u64,
        direction: Direction,
        visibility: Visibility,
    ) -> Result<SignalId, SimError> {
        self.ensure_free(&full)?;
        let id = self.store.alloc_signal(full.clone(), width, init)?;
        self.registry.insert(VarEntry {
            name: full,
            scope,
            handle: Handle::Signal(id),
            width,
            msb: width - 1,
            lsb: 0,
            depth: None,
            direction,
            visibility,
            access: Access::ReadWrite,
        })?;
        Ok(id)
    }

    fn scoped(&self, name: &str) -> String {
        format!("{}.{name}", self.module)
    }

    fn ensure_free(&self, full: &str) -> Result<(), SimError> {
        if self.registry.contains(full) {
            Err(SimError::design(format!("'{full}' is declared twice")))
        } else {
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ports_register_in_both_scopes() {
        let mut b = DesignBuilder::new("m");
        let p = b.input("a", 4).unwrap();
        let design = b.build().unwrap();
        let top = design.registry().get("TOP.a").unwrap();
        assert_eq!(top.handle, Handle::Signal(p.top));
        assert_eq!(top.direction, Direction::Input);
        assert_eq!(top.visibility, Visibility::Public);
        assert_eq!(top.range(), "[3:0]");
        let inner = design.registry().get("m.a").unwrap();
        assert_eq!(inner.handle, Handle::Signal(p.inner));
        assert_eq!(inner.direction, Direction::Internal);
        assert_eq!(inner.visibility, Visibility::Internal);
    }

    #[test]
    fn duplicate_declaration_rejected() {
        let mut b = DesignBuilder::new("m");
        b.signal("x", 1).unwrap();
        assert!(matches!(b.signal("x", 1), Err(SimError::Design { .. })));
        assert!(matches!(b.memory("x", 8, 4), Err(SimError::Design { .. })));
    }

    #[test]
    fn port_clashing_with_internal_name_rejected() {
        let mut b = DesignBuilder::new("m");
        b.signal("clk", 1).unwrap();
        assert!(b.input("clk", 1).is_err());
    }

    #[test]
    fn params_are_read_only_constants() {
        let mut b = DesignBuilder::new("m");
        b.param("IDLE", 1, 0).unwrap();
        assert!(matches!(
            b.param("BIG", 2, 4),
            Err(SimError::WidthViolation { .. })
        ));
        let design = b.build().unwrap();
        let p = design.registry().get("m.IDLE").unwrap();
        assert_eq!(p.access, Access::ReadOnly);
        assert_eq!(p.handle, Handle::Const(0));
    }

    #[test]
    fn trigger_descriptions_use_signal_names() {
        let mut b = DesignBuilder::new("m");
        let clk = b.input("clk", 1).unwrap();
        let rst = b.input("rst_n", 1).unwrap();
        b.posedge(clk.inner);
        b.negedge(rst.inner);
        let design = b.build().unwrap();
        let descs: Vec<_> = design
            .act_triggers()
            .iter()
            .map(|t| t.description.as_str())
            .collect();
        assert_eq!(descs, vec!["@(posedge m.clk)", "@(negedge m.rst_n)"]);
    }

    #[test]
    fn empty_sensitivity_rejected() {
        let mut b = DesignBuilder::new("m");
        b.combinational("nothing", &[], |_| Ok(()));
        assert!(matches!(b.build(), Err(SimError::Design { .. })));
    }

    #[test]
    fn dangling_trigger_rejected() {
        let mut b = DesignBuilder::new("m");
        b.sequential("bad", &[TriggerId::from_raw(3)], |_| Ok(()));
        let err = b.build().err().unwrap();
        assert!(err.to_string().contains("unknown trigger 3"));
    }

    #[test]
    fn blocks_keep_insertion_order() {
        let mut b = DesignBuilder::new("m");
        let clk = b.input("clk", 1).unwrap();
        let t = b.posedge(clk.inner);
        b.sequential("first", &[t], |_| Ok(()))
            .sequential("second", &[t], |_| Ok(()))
            .input_combinational("ico", |_| Ok(()));
        let design = b.build().unwrap();
        assert_eq!(design.block_count(), 3);
        assert_eq!(
            design.block_names(BlockKind::Sequential),
            vec!["first", "second"]
        );
        assert_eq!(
            design.block_names(BlockKind::InputCombinational),
            vec!["ico"]
        );
    }

    #[test]
    fn memory_registered_with_depth() {
        let mut b = DesignBuilder::new("m");
        b.memory("mem", 32, 1024).unwrap();
        let design = b.build().unwrap();
        let e = design.registry().get("m.mem").unwrap();
        assert_eq!(e.depth, Some(1024));
        assert_eq!(e.range(), "[31:0]");
    }
}
