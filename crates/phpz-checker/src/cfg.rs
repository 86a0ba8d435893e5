//! Control-flow graph construction.
//!
//! Structured statements are lowered into basic blocks here, before any
//! binding happens: blocks hold the original syntax statements, and the
//! analysis re-binds them against the block's entry state on every visit.
//! Edges are unconditional jumps, two-way conditional branches, or
//! exceptional edges into catch/finally regions. There is exactly one start
//! and one exit block.

use crate::flow::FlowState;
use phpz_ast::{Expr, Stmt};
use phpz_binder::BoundId;
use smallvec::SmallVec;
use tracing::debug;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct BlockId(pub u32);

#[derive(Clone, Debug)]
pub enum Terminator {
    /// Fall through to a single successor.
    Jump(BlockId),
    /// Two-way branch on a condition expression, re-bound each visit.
    Branch {
        condition: Expr,
        if_true: BlockId,
        if_false: BlockId,
    },
    /// Routine exit; only the exit block carries this.
    End,
}

/// One basic block: an ordered run of simple statements plus its outgoing
/// edges. `flow_state` is the block's entry state, absent until the block
/// is first visited by analysis.
#[derive(Clone, Debug)]
pub struct BoundBlock {
    pub stmts: Vec<Stmt>,
    pub terminator: Terminator,
    /// Exceptional successors (active catch/finally handlers).
    pub exceptional: SmallVec<[BlockId; 2]>,
    /// When this block is a catch handler: (class name, catch variable).
    pub catch: Option<(String, String)>,
    pub flow_state: Option<FlowState>,
    /// Bound forms of `stmts` from the most recent binding pass.
    pub bound: Vec<BoundId>,
    /// Bound form of the branch condition from the most recent pass.
    pub bound_condition: Option<BoundId>,
}

impl BoundBlock {
    fn new() -> Self {
        Self {
            stmts: Vec::new(),
            terminator: Terminator::End,
            exceptional: SmallVec::new(),
            catch: None,
            flow_state: None,
            bound: Vec::new(),
            bound_condition: None,
        }
    }
}

#[derive(Clone, Debug)]
pub struct ControlFlowGraph {
    blocks: Vec<BoundBlock>,
    start: BlockId,
    exit: BlockId,
}

impl ControlFlowGraph {
    /// Lower a routine body into blocks and edges.
    pub fn build(body: Vec<Stmt>) -> Self {
        let mut b = Builder {
            blocks: vec![BoundBlock::new(), BoundBlock::new()],
            handlers: Vec::new(),
            current: BlockId(0),
        };
        b.lower_all(body);
        b.seal(Terminator::Jump(Builder::EXIT));
        let cfg = Self {
            blocks: b.blocks,
            start: BlockId(0),
            exit: Builder::EXIT,
        };
        debug!(blocks = cfg.blocks.len(), "control-flow graph built");
        cfg
    }

    pub fn start(&self) -> BlockId {
        self.start
    }

    pub fn exit(&self) -> BlockId {
        self.exit
    }

    pub fn block(&self, id: BlockId) -> &BoundBlock {
        &self.blocks[id.0 as usize]
    }

    pub fn block_mut(&mut self, id: BlockId) -> &mut BoundBlock {
        &mut self.blocks[id.0 as usize]
    }

    pub fn block_count(&self) -> usize {
        self.blocks.len()
    }

    pub fn block_ids(&self) -> impl Iterator<Item = BlockId> {
        (0..self.blocks.len() as u32).map(BlockId)
    }

    /// Non-exceptional successors of a block.
    pub fn successors(&self, id: BlockId) -> SmallVec<[BlockId; 2]> {
        match &self.block(id).terminator {
            Terminator::Jump(t) => SmallVec::from_slice(&[*t]),
            Terminator::Branch {
                if_true, if_false, ..
            } => SmallVec::from_slice(&[*if_true, *if_false]),
            Terminator::End => SmallVec::new(),
        }
    }
}

struct Builder {
    blocks: Vec<BoundBlock>,
    /// Innermost-first stack of active exceptional targets.
    handlers: Vec<BlockId>,
    current: BlockId,
}

impl Builder {
    const EXIT: BlockId = BlockId(1);

    fn new_block(&mut self) -> BlockId {
        let id = BlockId(self.blocks.len() as u32);
        let mut block = BoundBlock::new();
        block.exceptional = SmallVec::from_vec(self.handlers.clone());
        self.blocks.push(block);
        id
    }

    fn push_stmt(&mut self, stmt: Stmt) {
        self.blocks[self.current.0 as usize].stmts.push(stmt);
    }

    /// Terminate the current block and continue in `next` if given.
    fn seal(&mut self, terminator: Terminator) {
        self.blocks[self.current.0 as usize].terminator = terminator;
    }

    fn lower_all(&mut self, stmts: Vec<Stmt>) {
        for stmt in stmts {
            self.lower(stmt);
        }
    }

    fn lower(&mut self, stmt: Stmt) {
        match stmt {
            Stmt::Block { body, .. } => self.lower_all(body),
            Stmt::Empty { .. } => {}
            Stmt::If {
                cond,
                then,
                otherwise,
                ..
            } => {
                let then_b = self.new_block();
                let else_b = if otherwise.is_empty() {
                    None
                } else {
                    Some(self.new_block())
                };
                let join = self.new_block();
                self.seal(Terminator::Branch {
                    condition: cond,
                    if_true: then_b,
                    if_false: else_b.unwrap_or(join),
                });
                self.current = then_b;
                self.lower_all(then);
                self.seal(Terminator::Jump(join));
                if let Some(else_b) = else_b {
                    self.current = else_b;
                    self.lower_all(otherwise);
                    self.seal(Terminator::Jump(join));
                }
                self.current = join;
            }
            Stmt::While { cond, body, .. } => {
                let head = self.new_block();
                let body_b = self.new_block();
                let after = self.new_block();
                self.seal(Terminator::Jump(head));
                self.current = head;
                self.seal(Terminator::Branch {
                    condition: cond,
                    if_true: body_b,
                    if_false: after,
                });
                self.current = body_b;
                self.lower_all(body);
                // Back edge into the loop head.
                self.seal(Terminator::Jump(head));
                self.current = after;
            }
            Stmt::DoWhile { body, cond, .. } => {
                let body_b = self.new_block();
                let after = self.new_block();
                self.seal(Terminator::Jump(body_b));
                self.current = body_b;
                self.lower_all(body);
                self.seal(Terminator::Branch {
                    condition: cond,
                    if_true: body_b,
                    if_false: after,
                });
                self.current = after;
            }
            Stmt::For {
                init,
                cond,
                step,
                body,
                ..
            } => {
                for e in init {
                    self.push_stmt(Stmt::expr(e));
                }
                let head = self.new_block();
                let body_b = self.new_block();
                let after = self.new_block();
                self.seal(Terminator::Jump(head));
                self.current = head;
                match cond {
                    Some(condition) => self.seal(Terminator::Branch {
                        condition,
                        if_true: body_b,
                        if_false: after,
                    }),
                    // `for (;;)` loops until something jumps out.
                    None => self.seal(Terminator::Jump(body_b)),
                }
                self.current = body_b;
                self.lower_all(body);
                for e in step {
                    self.push_stmt(Stmt::expr(e));
                }
                self.seal(Terminator::Jump(head));
                self.current = after;
            }
            Stmt::TryCatch {
                body,
                catches,
                finally,
                ..
            } => {
                let after = self.new_block();
                let finally_b = if finally.is_empty() {
                    None
                } else {
                    Some(self.new_block())
                };
                let landing = finally_b.unwrap_or(after);

                // Catch handler blocks are exceptional targets for the
                // whole try region.
                let mut catch_blocks = Vec::with_capacity(catches.len());
                for c in &catches {
                    let cb = self.new_block();
                    self.blocks[cb.0 as usize].catch =
                        Some((c.class_name.clone(), c.variable.clone()));
                    catch_blocks.push(cb);
                }

                // Every block of the region, including its entry, carries
                // the handlers as exceptional successors.
                let depth = self.handlers.len();
                self.handlers.extend(catch_blocks.iter().copied());
                if let Some(f) = finally_b {
                    self.handlers.push(f);
                }
                let body_b = self.new_block();
                self.seal(Terminator::Jump(body_b));
                self.current = body_b;
                self.lower_all(body);
                self.handlers.truncate(depth);
                self.seal(Terminator::Jump(landing));

                for (cb, c) in catch_blocks.into_iter().zip(catches) {
                    self.current = cb;
                    self.lower_all(c.body);
                    self.seal(Terminator::Jump(landing));
                }
                if let Some(f) = finally_b {
                    self.current = f;
                    self.lower_all(finally);
                    self.seal(Terminator::Jump(after));
                }
                self.current = after;
            }
            Stmt::Return { .. } | Stmt::Throw { .. } => {
                self.push_stmt(stmt);
                self.seal(Terminator::Jump(Self::EXIT));
                // Anything following is unreachable but still lowered.
                self.current = self.new_block();
            }
            simple => self.push_stmt(simple),
        }
    }
}
