//! Symbol table: name resolution, method context and label generation
//!
//! The table is built once from a finished [`Program`] and then consulted by
//! the code generator:
//!
//! - Globals get byte offsets `0, w, 2w, ...` from the data pointer, in
//!   declaration order (`w` = word size). Arrays are one word: a reference.
//! - Each method's parameters and locals get independent 1-based positions;
//!   the code generator turns those into frame-pointer displacements.
//! - [`SymbolTable::resolve`] looks a name up in the active method's locals,
//!   then its parameters, then the globals.
//! - The active method is a single slot, entered through a [`MethodScope`]
//!   guard that releases it on drop, so the slot is cleared on every path out
//!   of a method's code generation, including errors.
//! - Labels live in disjoint namespaces: `$_name` for methods, `$v_name` for
//!   global data words, `$s_name` for scratch data words and `$$_prefix_n`
//!   for fresh control-flow labels. The fresh-label counter belongs to the
//!   table, so each compile starts from zero and never repeats a label.

use std::ops::{Deref, DerefMut};

use rustc_hash::FxHashMap;

use crate::compiler::errors::{CompileError, CompileResult};
use crate::compiler::codegen::FRAME_LINKAGE_WORDS;
use crate::config::{CompilerConfig, ShadowPolicy, MAX_WORD_SIZE};
use crate::parser::ast::{MethodDecl, Program, VarDecl, VarType};

/// How a variable's storage is addressed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScopeKind {
    Global,
    Parameter,
    Local,
}

/// Result of resolving a variable name.
///
/// For globals `offset` is a byte offset from the data pointer; for
/// parameters and locals it is the 1-based position in the declaration list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VarInfo {
    pub kind: ScopeKind,
    pub offset: i32,
    pub var_type: VarType,
}

#[derive(Debug, Clone, Copy)]
struct Slot {
    offset: i32,
    var_type: VarType,
}

/// What the code generator needs to know about one method
#[derive(Debug, Clone)]
pub struct MethodInfo {
    pub return_type: Option<VarType>,
    params: FxHashMap<String, Slot>,
    locals: FxHashMap<String, Slot>,
    param_count: usize,
    local_count: usize,
}

impl MethodInfo {
    pub fn local_count(&self) -> usize {
        self.local_count
    }

    /// Parameters plus locals: the slots released when the method returns
    pub fn frame_size(&self) -> usize {
        self.param_count + self.local_count
    }
}

#[derive(Debug)]
pub struct SymbolTable {
    globals: FxHashMap<String, Slot>,
    global_order: Vec<String>,
    methods: FxHashMap<String, MethodInfo>,
    current_method: Option<String>,
    scratch_words: Vec<String>,
    next_label: usize,
    word_size: i32,
}

impl SymbolTable {
    /// Build the table for `program`, rejecting duplicate declarations.
    pub fn new(program: &Program, config: &CompilerConfig) -> CompileResult<Self> {
        if !(1..=MAX_WORD_SIZE).contains(&config.word_size) {
            return Err(CompileError::InvalidLayout {
                message: format!(
                    "word size {} is outside 1..={}",
                    config.word_size, MAX_WORD_SIZE
                ),
            });
        }

        let mut table = SymbolTable {
            globals: FxHashMap::default(),
            global_order: Vec::with_capacity(program.globals.len()),
            methods: FxHashMap::default(),
            current_method: None,
            scratch_words: Vec::new(),
            next_label: 0,
            word_size: config.word_size,
        };

        for decl in &program.globals {
            table.declare_global(decl)?;
        }
        for method in &program.methods {
            table.declare_method(method, config.shadowing)?;
        }

        tracing::debug!(
            globals = table.global_order.len(),
            methods = table.methods.len(),
            "built symbol table"
        );

        Ok(table)
    }

    fn declare_global(&mut self, decl: &VarDecl) -> CompileResult<()> {
        if self.globals.contains_key(&decl.name) {
            return Err(CompileError::DuplicateDeclaration {
                name: decl.name.clone(),
                scope: "global scope".to_string(),
                location: Some(decl.location),
            });
        }

        let offset = self.byte_offset(self.global_order.len(), &decl.name)?;
        self.globals.insert(
            decl.name.clone(),
            Slot {
                offset,
                var_type: decl.var_type,
            },
        );
        self.global_order.push(decl.name.clone());
        Ok(())
    }

    fn declare_method(&mut self, method: &MethodDecl, shadowing: ShadowPolicy) -> CompileResult<()> {
        if self.methods.contains_key(&method.name) {
            return Err(CompileError::DuplicateDeclaration {
                name: method.name.clone(),
                scope: "the method namespace".to_string(),
                location: Some(method.location),
            });
        }

        let params = self.positional_slots(
            &method.params,
            &format!("the parameters of '{}'", method.name),
        )?;
        let locals = self.positional_slots(
            &method.locals,
            &format!("the locals of '{}'", method.name),
        )?;

        for local in &method.locals {
            if params.contains_key(&local.name) {
                return Err(CompileError::DuplicateDeclaration {
                    name: local.name.clone(),
                    scope: format!("method '{}', where it is already a parameter", method.name),
                    location: Some(local.location),
                });
            }
        }

        for decl in method.params.iter().chain(&method.locals) {
            if self.globals.contains_key(&decl.name) {
                self.report_shadowing(method, decl, shadowing)?;
            }
        }

        self.methods.insert(
            method.name.clone(),
            MethodInfo {
                return_type: method.return_type,
                param_count: method.params.len(),
                local_count: method.locals.len(),
                params,
                locals,
            },
        );
        Ok(())
    }

    /// 1-based positions for a parameter or local list
    fn positional_slots(
        &self,
        decls: &[VarDecl],
        scope: &str,
    ) -> CompileResult<FxHashMap<String, Slot>> {
        let mut slots = FxHashMap::default();
        for (index, decl) in decls.iter().enumerate() {
            // The farthest word from fp a slot can need: parameters sit past the linkage words
            self.byte_offset(index + 1 + FRAME_LINKAGE_WORDS as usize, &decl.name)?;
            let slot = Slot {
                offset: index as i32 + 1,
                var_type: decl.var_type,
            };
            if slots.insert(decl.name.clone(), slot).is_some() {
                return Err(CompileError::DuplicateDeclaration {
                    name: decl.name.clone(),
                    scope: scope.to_string(),
                    location: Some(decl.location),
                });
            }
        }
        Ok(slots)
    }

    /// `words * word_size`, if it fits an SSM word
    fn byte_offset(&self, words: usize, name: &str) -> CompileResult<i32> {
        i32::try_from(words)
            .ok()
            .and_then(|words| words.checked_mul(self.word_size))
            .ok_or_else(|| CompileError::InvalidLayout {
                message: format!(
                    "the slot of '{}' is out of range for word size {}",
                    name, self.word_size
                ),
            })
    }

    fn report_shadowing(
        &self,
        method: &MethodDecl,
        decl: &VarDecl,
        shadowing: ShadowPolicy,
    ) -> CompileResult<()> {
        match shadowing {
            ShadowPolicy::Allow => Ok(()),
            ShadowPolicy::Warn => {
                tracing::warn!(
                    method = %method.name,
                    variable = %decl.name,
                    line = decl.location.line,
                    "declaration hides the global of the same name inside this method"
                );
                Ok(())
            }
            ShadowPolicy::Reject => Err(CompileError::DuplicateDeclaration {
                name: decl.name.clone(),
                scope: format!("method '{}', where it would hide a global", method.name),
                location: Some(decl.location),
            }),
        }
    }

    // ===== Name resolution =====

    /// Resolve a variable: active method's locals, then its parameters, then globals.
    pub fn resolve(&self, name: &str) -> CompileResult<VarInfo> {
        if let Some(method) = self.current_method_info() {
            if let Some(slot) = method.locals.get(name) {
                return Ok(VarInfo {
                    kind: ScopeKind::Local,
                    offset: slot.offset,
                    var_type: slot.var_type,
                });
            }
            if let Some(slot) = method.params.get(name) {
                return Ok(VarInfo {
                    kind: ScopeKind::Parameter,
                    offset: slot.offset,
                    var_type: slot.var_type,
                });
            }
        }

        self.globals
            .get(name)
            .map(|slot| VarInfo {
                kind: ScopeKind::Global,
                offset: slot.offset,
                var_type: slot.var_type,
            })
            .ok_or_else(|| CompileError::undeclared_variable(name))
    }

    /// Look up a declared method
    pub fn method(&self, name: &str) -> CompileResult<&MethodInfo> {
        self.methods
            .get(name)
            .ok_or_else(|| CompileError::undeclared_method(name))
    }

    /// Global names in declaration order (the data segment layout)
    pub fn globals(&self) -> impl Iterator<Item = &str> {
        self.global_order.iter().map(String::as_str)
    }

    pub fn word_size(&self) -> i32 {
        self.word_size
    }

    // ===== Method context =====

    /// Make `name` the active method until the returned guard is dropped.
    pub fn enter_method(&mut self, name: &str) -> CompileResult<MethodScope<'_>> {
        self.method(name)?;
        if let Some(active) = &self.current_method {
            return Err(CompileError::scope_context(format!(
                "cannot enter method '{}' while generating code for '{}'",
                name, active
            )));
        }

        self.current_method = Some(name.to_string());
        Ok(MethodScope { table: self })
    }

    /// Clear the active method. Normally called by [`MethodScope`] on drop.
    pub fn exit_method(&mut self) -> CompileResult<()> {
        match self.current_method.take() {
            Some(_) => Ok(()),
            None => Err(CompileError::scope_context(
                "exit from a method while no method is active",
            )),
        }
    }

    pub fn current_method(&self) -> Option<&str> {
        self.current_method.as_deref()
    }

    fn current_method_info(&self) -> Option<&MethodInfo> {
        self.current_method
            .as_ref()
            .and_then(|name| self.methods.get(name))
    }

    /// Number of locals of the active method
    pub fn local_count(&self) -> CompileResult<usize> {
        self.active_method("locals").map(MethodInfo::local_count)
    }

    /// Parameters plus locals of the active method
    pub fn frame_size(&self) -> CompileResult<usize> {
        self.active_method("a frame").map(MethodInfo::frame_size)
    }

    fn active_method(&self, what: &str) -> CompileResult<&MethodInfo> {
        self.current_method_info().ok_or_else(|| {
            CompileError::scope_context(format!("{} requested outside any method", what))
        })
    }

    // ===== Labels =====

    pub fn method_label(&self, name: &str) -> String {
        format!("$_{}", name)
    }

    /// Label of a global's data word
    pub fn variable_label(&self, name: &str) -> String {
        format!("$v_{}", name)
    }

    /// Label of a compiler-owned scratch data word; the word is reserved
    /// in the data segment once any code asks for it.
    pub fn scratch_label(&mut self, name: &str) -> String {
        let label = format!("$s_{}", name);
        if !self.scratch_words.contains(&label) {
            self.scratch_words.push(label.clone());
        }
        label
    }

    /// Scratch words requested so far, in first-use order
    pub fn scratch_words(&self) -> impl Iterator<Item = &str> {
        self.scratch_words.iter().map(String::as_str)
    }

    /// A label never returned before by this table
    pub fn fresh_label(&mut self, prefix: &str) -> String {
        let label = format!("$$_{}_{}", prefix, self.next_label);
        self.next_label += 1;
        tracing::trace!(%label, "fresh label");
        label
    }
}

/// The active-method context of a [`SymbolTable`].
///
/// Created by [`SymbolTable::enter_method`]; dereferences to the table and
/// clears the active method when dropped.
#[derive(Debug)]
pub struct MethodScope<'a> {
    table: &'a mut SymbolTable,
}

impl Deref for MethodScope<'_> {
    type Target = SymbolTable;

    fn deref(&self) -> &SymbolTable {
        self.table
    }
}

impl DerefMut for MethodScope<'_> {
    fn deref_mut(&mut self) -> &mut SymbolTable {
        self.table
    }
}

impl Drop for MethodScope<'_> {
    fn drop(&mut self) {
        // Already cleared if the owner exited explicitly through DerefMut.
        let _ = self.table.exit_method();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse::Parser;

    fn table(source: &str) -> CompileResult<SymbolTable> {
        table_with(source, &CompilerConfig::default())
    }

    fn table_with(source: &str, config: &CompilerConfig) -> CompileResult<SymbolTable> {
        let program = Parser::new(source).unwrap().parse_program().unwrap();
        SymbolTable::new(&program, config)
    }

    const PROGRAM: &str = r#"
        BEGIN int x; int[][] grid; int y; END
        FUN int f(int a, int[] b) { int x; int c; RETURN a; }
        PROC g() { }
    "#;

    #[test]
    fn test_global_offsets_are_contiguous_words() {
        let st = table(PROGRAM).unwrap();
        let offsets: Vec<i32> = ["x", "grid", "y"]
            .iter()
            .map(|name| st.resolve(name).unwrap().offset)
            .collect();
        assert_eq!(offsets, vec![0, 4, 8]);
        assert_eq!(st.globals().collect::<Vec<_>>(), vec!["x", "grid", "y"]);

        let wide = table_with(PROGRAM, &CompilerConfig::default().with_word_size(8)).unwrap();
        assert_eq!(wide.resolve("y").unwrap().offset, 16);
    }

    #[test]
    fn test_resolution_order_inside_method() {
        let mut st = table_with(
            PROGRAM,
            &CompilerConfig::default().with_shadowing(ShadowPolicy::Allow),
        )
        .unwrap();

        assert_eq!(st.resolve("x").unwrap().kind, ScopeKind::Global);
        assert!(st.resolve("a").is_err());

        {
            let scope = st.enter_method("f").unwrap();
            let x = scope.resolve("x").unwrap();
            assert_eq!(x.kind, ScopeKind::Local);
            assert_eq!(x.offset, 1);
            let c = scope.resolve("c").unwrap();
            assert_eq!((c.kind, c.offset), (ScopeKind::Local, 2));
            let b = scope.resolve("b").unwrap();
            assert_eq!((b.kind, b.offset), (ScopeKind::Parameter, 2));
            assert_eq!(b.var_type, VarType::Array(1));
            assert_eq!(scope.resolve("y").unwrap().kind, ScopeKind::Global);
            assert_eq!(scope.frame_size().unwrap(), 4);
        }

        assert_eq!(st.current_method(), None);
        assert_eq!(st.resolve("x").unwrap().kind, ScopeKind::Global);
    }

    #[test]
    fn test_method_context_pairing() {
        let mut st = table(PROGRAM).unwrap();

        assert!(matches!(
            st.enter_method("missing"),
            Err(CompileError::UndeclaredName { .. })
        ));
        assert!(matches!(st.exit_method(), Err(CompileError::ScopeContext { .. })));
        assert!(matches!(st.frame_size(), Err(CompileError::ScopeContext { .. })));

        let mut scope = st.enter_method("g").unwrap();
        assert_eq!(scope.current_method(), Some("g"));
        assert!(matches!(
            scope.enter_method("f"),
            Err(CompileError::ScopeContext { .. })
        ));
        drop(scope);

        assert_eq!(st.current_method(), None);
        assert!(st.enter_method("f").is_ok());
    }

    #[test]
    fn test_context_released_when_body_fails() {
        let mut st = table(PROGRAM).unwrap();

        let failing = |st: &mut SymbolTable| -> CompileResult<()> {
            let scope = st.enter_method("f")?;
            scope.resolve("nope")?;
            Ok(())
        };
        assert!(failing(&mut st).is_err());
        assert_eq!(st.current_method(), None);
    }

    #[test]
    fn test_fresh_labels_are_unique() {
        let mut st = table(PROGRAM).unwrap();
        let mut seen = std::collections::HashSet::new();
        for _ in 0..50 {
            assert!(seen.insert(st.fresh_label("if_else")));
            assert!(seen.insert(st.fresh_label("if_end")));
        }
        assert_eq!(st.fresh_label("loop"), "$$_loop_100");
    }

    #[test]
    fn test_label_namespaces_are_disjoint() {
        let mut st = table(PROGRAM).unwrap();
        assert_eq!(st.method_label("f"), "$_f");
        assert_eq!(st.variable_label("f"), "$v_f");
        assert_eq!(st.scratch_label("f"), "$s_f");
        assert!(st.fresh_label("f").starts_with("$$_"));

        st.scratch_label("switch");
        st.scratch_label("switch");
        assert_eq!(st.scratch_words().collect::<Vec<_>>(), vec!["$s_f", "$s_switch"]);
    }

    #[test]
    fn test_duplicate_declarations() {
        let cases = [
            "BEGIN int x; int x; END",
            "BEGIN END PROC p() { } PROC p() { }",
            "BEGIN END PROC p(int a, int a) { }",
            "BEGIN END PROC p() { int a; int a; }",
            "BEGIN END PROC p(int a) { int a; }",
        ];
        for source in cases {
            assert!(
                matches!(table(source), Err(CompileError::DuplicateDeclaration { .. })),
                "expected duplicate declaration for {}",
                source
            );
        }
    }

    #[test]
    fn test_shadowing_policy() {
        let source = "BEGIN int x; END PROC p(int x) { }";
        assert!(table(source).is_ok());

        let reject = CompilerConfig::default().with_shadowing(ShadowPolicy::Reject);
        let err = table_with(source, &reject).unwrap_err();
        assert!(err.to_string().contains("hide a global"));
    }

    #[test]
    fn test_word_size_must_keep_offsets_in_range() {
        let err = table_with("BEGIN END", &CompilerConfig::default().with_word_size(0)).unwrap_err();
        assert!(matches!(err, CompileError::InvalidLayout { .. }));

        let huge = CompilerConfig::default().with_word_size(1_500_000_000);
        let err = table_with("BEGIN int a; int b; int c; END", &huge).unwrap_err();
        assert!(matches!(err, CompileError::InvalidLayout { .. }));

        let widest = CompilerConfig::default().with_word_size(MAX_WORD_SIZE);
        let st = table_with("BEGIN int a; int b; int c; END", &widest).unwrap();
        assert_eq!(st.resolve("c").unwrap().offset, 2 * MAX_WORD_SIZE);
    }
}
