//! Code-generation state shared across expression, statement, and function
//! lowering — the Rust model of `spec.md` §3's "CodeGen state".
//!
//! A single [`Lowering`] is created per compilation and threaded through
//! every `lower_*` call in [`crate::expr`], [`crate::stmt`], and
//! [`crate::function`]. It owns the two output buffers (forward
//! declarations and definitions — functions and closure-environment structs
//! must be declared before `main` references them, so lambdas emit into
//! `forward_decls`/`definitions` rather than inline), the arena/loop/private
//! stacks C1 describes, the label/temp counters, and a small local scope
//! stack reused from `emberc-typecheck` to recover variable types that
//! `emberc-typecheck` computed but did not write back onto the AST.

use emberc_mem::{StringInterner, Symbol};
use emberc_syntax::ast::decl::FunctionModifier;
use emberc_syntax::ast::ty::Primitive;
use emberc_syntax::ast::Type;
use emberc_typecheck::context::{Binding, Scopes, SymbolKind};
use emberc_typecheck::FnSig;
use std::collections::{HashMap, HashSet};

/// `spec.md` §4.5's two-mode arithmetic discipline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArithmeticMode {
    /// Every primitive operator routes through a runtime call that traps on
    /// overflow and divide/modulo-by-zero. The default.
    Checked,
    /// Addition, subtraction, multiplication, comparisons, and unary
    /// negation emit native C operators; division and modulo still call the
    /// runtime (zero-check is required for defined behavior).
    Unchecked,
}

/// A live per-iteration loop frame (`spec.md` §4.3).
pub struct LoopFrame {
    /// The loop's own arena variable, absent when the loop runs in a shared
    /// context (no per-iteration arena is created there).
    pub arena_var: Option<String>,
    /// Scope-stack depth (`Scopes` frame count) at the moment the loop body
    /// was entered — used to decide whether a variable referenced inside the
    /// loop was declared outside it (`spec.md` §4.3's string-longevity rule).
    pub entry_scope_depth: usize,
    /// The label `continue` jumps to: destroys `arena_var` (if any) and
    /// falls through to the loop's own increment/condition re-check
    /// (`spec.md` §4.3's per-loop cleanup label).
    pub cleanup_label: String,
}

/// A live `private { }` block frame.
pub struct PrivateFrame {
    /// The block's own arena variable.
    pub arena_var: String,
}

/// Per-function lowering context, reset at the start of [`crate::function`]'s
/// entry point for every `Decl::Fn`.
pub struct Lowering<'a> {
    /// Resolves identifiers to source text for emission and diagnostics.
    pub interner: &'a StringInterner,
    /// Every declared function's signature and resolved modifier.
    pub signatures: &'a HashMap<Symbol, FnSig>,
    /// Arithmetic discipline selected by the `-O` flag (`spec.md` §4.5):
    /// `-O0` is CHECKED, `-O1`/`-O2` are UNCHECKED.
    pub arithmetic_mode: ArithmeticMode,

    /// Forward declarations (closure-environment structs, lambda bodies,
    /// function prototypes) that must precede their first use.
    pub forward_decls: String,
    /// Function and closure-body definitions, emitted in declaration order.
    pub definitions: String,

    label_counter: u32,
    temp_counter: u32,
    arena_counter: u32,
    closure_counter: u32,

    /// Current arena C expression (`"__arena_3__"`, `"NULL"`, or the
    /// `SHARED` hidden parameter name) — what a runtime call needing an
    /// arena argument should reference right now. `None` means no arena is
    /// in scope (a `DEFAULT` function with no heap use — `spec.md` §4.3's
    /// "the literal `NULL`" case is still represented as `Some("NULL")` once
    /// a runtime call forces the question; this field is the *live binding*
    /// the call would look up, not the literal fallback).
    pub current_arena: Option<String>,
    /// The function-level arena's own variable name (`__arena_1__`),
    /// recorded separately from `current_arena` so that a string mutated
    /// across loop iterations can be promoted to it (`spec.md` §4.3).
    pub function_arena: Option<String>,
    /// `true` inside a `shared { }` block or a `SHARED` function: nested
    /// loops do not create per-iteration arenas.
    pub shared_context: bool,

    /// Live private-block arenas, innermost last.
    pub private_stack: Vec<PrivateFrame>,
    /// Live per-iteration loop arenas, innermost last.
    pub loop_stack: Vec<LoopFrame>,

    /// Lambda nesting depth — `> 0` while lowering inside a lambda body,
    /// used by capture analysis and by name resolution for AS_REF reads.
    pub lambda_depth: u32,
    /// Captured-primitive list for the function currently being lowered,
    /// populated by [`crate::capture`] and reset per function.
    pub captured: HashSet<Symbol>,
    /// Names bound with AS_REF storage in the current function: captured
    /// primitives (the only AS_REF source this grammar produces — see
    /// DESIGN.md's note on the qualifier surface syntax).
    pub as_ref_locals: HashSet<Symbol>,
    /// Loop binder names provably non-negative (range loop counters),
    /// innermost last — used by C3's index-bounds elision.
    pub loop_counters: Vec<Symbol>,

    /// `true` while lowering a function whose body was wrapped in the
    /// tail-call trampoline `while (1) { ... }`.
    pub in_tail_call_function: bool,
    /// The function currently being lowered, for tail-call identity checks.
    pub current_fn: Symbol,
    /// `current_fn`'s parameters, in declaration order — the rebind targets
    /// for a self-tail-call's trampoline `continue`. Set by
    /// [`crate::function`] right after [`Self::begin_function`].
    pub current_params: Vec<Symbol>,
    /// Spans of `return` statements eligible for the tail-call trampoline.
    pub tail_calls: &'a HashSet<emberc_syntax::span::Span>,
    /// The label `return` jumps to after emitting the early-exit cleanup
    /// sequence (`spec.md` §4.3) — the function's epilogue destroys the
    /// function-level arena there. Set by [`crate::function`] once per
    /// function, after [`Self::begin_function`] resets the label counter.
    pub return_label: String,

    /// Scope stack recovering each local's declared type — `emberc-typecheck`
    /// computes this once during checking but does not write it back onto
    /// the AST, so lowering recomputes it the same way (`spec.md` §3's
    /// Symbol/Binding, reused directly from `emberc-typecheck::context`).
    pub scopes: Scopes,
    /// Scope-stack depth each local was declared at, restricted to the
    /// current function — used alongside `loop_stack` for the
    /// string-longevity rule.
    pub decl_scope_depth: HashMap<Symbol, usize>,
}

impl<'a> Lowering<'a> {
    /// Creates a fresh lowering context for one compilation unit.
    #[must_use]
    pub fn new(
        interner: &'a StringInterner,
        signatures: &'a HashMap<Symbol, FnSig>,
        tail_calls: &'a HashSet<emberc_syntax::span::Span>,
        arithmetic_mode: ArithmeticMode,
    ) -> Self {
        Lowering {
            interner,
            signatures,
            arithmetic_mode,
            forward_decls: String::new(),
            definitions: String::new(),
            label_counter: 0,
            temp_counter: 0,
            arena_counter: 0,
            closure_counter: 0,
            current_arena: None,
            function_arena: None,
            shared_context: false,
            private_stack: Vec::new(),
            loop_stack: Vec::new(),
            lambda_depth: 0,
            captured: HashSet::new(),
            as_ref_locals: HashSet::new(),
            loop_counters: Vec::new(),
            in_tail_call_function: false,
            current_fn: Symbol::invalid(),
            current_params: Vec::new(),
            tail_calls,
            scopes: Scopes::new(),
            decl_scope_depth: HashMap::new(),
            return_label: String::new(),
        }
    }

    /// Resets all per-function state. Called once at the start of lowering
    /// each `Decl::Fn` (`spec.md` §4.4: the capture list "reset per
    /// function"; the rest of this state is equally function-scoped).
    pub fn begin_function(&mut self, name: Symbol) {
        self.arena_counter = 0;
        self.label_counter = 0;
        self.temp_counter = 0;
        self.current_arena = None;
        self.function_arena = None;
        self.shared_context = false;
        self.private_stack.clear();
        self.loop_stack.clear();
        self.lambda_depth = 0;
        self.captured.clear();
        self.as_ref_locals.clear();
        self.loop_counters.clear();
        self.in_tail_call_function = false;
        self.current_fn = name;
        self.current_params.clear();
        self.scopes = Scopes::new();
        self.decl_scope_depth.clear();
        self.return_label.clear();
    }

    /// Allocates the next `__arena_<n>__` name. Monotonic for the whole
    /// function — `spec.md` §4.3's "depth is a monotonically incremented
    /// counter reset per function" — so a private block's arena never
    /// collides with a sibling's even though both pop the stack in between.
    pub fn next_arena_name(&mut self) -> String {
        self.arena_counter += 1;
        format!("__arena_{}__", self.arena_counter)
    }

    /// A fresh `__label_<n>__` name (used for the function's return label).
    pub fn next_label(&mut self, tag: &str) -> String {
        self.label_counter += 1;
        format!("__{tag}_{}__", self.label_counter)
    }

    /// A fresh `__tmp_<n>__` name for a statement-expression temporary.
    pub fn next_temp(&mut self) -> String {
        self.temp_counter += 1;
        format!("__tmp_{}__", self.temp_counter)
    }

    /// A fresh closure id, shared by the environment struct name and the
    /// lambda body function name.
    pub fn next_closure_id(&mut self) -> u32 {
        self.closure_counter += 1;
        self.closure_counter
    }

    /// The C expression a runtime call needing an arena should use right
    /// now: the current live arena variable, or the literal `NULL` when
    /// none is in scope.
    #[must_use]
    pub fn arena_expr(&self) -> String {
        self.current_arena.clone().unwrap_or_else(|| "NULL".to_string())
    }

    /// The C expression for the function-level arena specifically (falls
    /// back to the live arena, then `NULL`) — used by the string-longevity
    /// rule in `spec.md` §4.3 when growing a string bound outside the
    /// current loop.
    #[must_use]
    pub fn function_arena_expr(&self) -> String {
        self.function_arena
            .clone()
            .or_else(|| self.current_arena.clone())
            .unwrap_or_else(|| "NULL".to_string())
    }

    /// Resolves `sym` to source text, or a placeholder if somehow unresolved
    /// (never expected once the checker has accepted the program).
    #[must_use]
    pub fn text(&self, sym: Symbol) -> &str {
        self.interner.resolve(sym).unwrap_or("?")
    }

    /// Binds a local at the current scope depth, recording both its type
    /// (for later `expr_type` lookups) and its declaration depth (for the
    /// string-longevity rule).
    pub fn bind_local(&mut self, name: Symbol, ty: Type) {
        let depth = self.scopes.depth();
        self.scopes.bind(name, ty, SymbolKind::Local);
        self.decl_scope_depth.insert(name, depth);
    }

    /// `true` if `name` was declared at a scope shallower than the
    /// innermost currently-live loop frame — i.e. it outlives this
    /// iteration and must not be allocated in the loop arena.
    #[must_use]
    pub fn declared_outside_current_loop(&self, name: Symbol) -> bool {
        let Some(frame) = self.loop_stack.last() else {
            return false;
        };
        self.decl_scope_depth
            .get(&name)
            .is_some_and(|&d| d < frame.entry_scope_depth)
    }

    /// Looks up a previously bound local/param's type.
    #[must_use]
    pub fn lookup_type(&self, name: Symbol) -> Option<&Type> {
        self.scopes.lookup(name).map(|b: &Binding| &b.ty)
    }

    /// `true` when `current_fn`'s declared return type is `any` — a
    /// `return` of a non-`any` value then needs the same boxing a `VarDecl`
    /// into an `any`-typed destination gets.
    #[must_use]
    pub fn return_type_is_any(&self) -> bool {
        self.signatures
            .get(&self.current_fn)
            .is_some_and(|sig| matches!(sig.return_type, Some(Type::Any { .. })))
    }
}

/// `true` for the primitive kinds `spec.md` §4.4's capture rule lifts:
/// int/long/double/bool/byte/char — every [`Primitive`] variant, in fact,
/// since Ember has no other scalar kind.
#[must_use]
pub fn is_primitive(ty: &Type) -> bool {
    matches!(ty, Type::Primitive { .. })
}

/// The modifier `main` is always treated as, regardless of what the source
/// wrote (`spec.md` §4.7: `main`'s signature is fixed, and the heap-return
/// promotion rule explicitly excludes it).
#[must_use]
pub fn is_main(interner: &StringInterner, name: Symbol) -> bool {
    interner.resolve(name) == Some("main")
}

#[must_use]
pub(crate) fn primitive_default(kind: Primitive) -> &'static str {
    match kind {
        Primitive::Int | Primitive::Long | Primitive::Byte | Primitive::Char => "0",
        Primitive::Double => "0.0",
        Primitive::Bool => "false",
    }
}

/// Default-modifier resolution mirrored from `emberc-typecheck::check`'s
/// promotion rule, used when a call site only has a [`FnSig`] (not a fresh
/// checker pass) to decide whether to prepend an arena argument.
#[must_use]
pub fn effective_modifier(sig: &FnSig) -> FunctionModifier {
    sig.effective_modifier
}
