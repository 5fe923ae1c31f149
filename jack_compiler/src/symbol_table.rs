use std::collections::HashMap;

/// The four Jack variable kinds (spec.md §4.1). Note this is Jack-only: the
/// mapping from kind to VM segment is deliberately not known here, it lives
/// in the compiler (`Compiler::resolve_symbol`) so the symbol table stays a
/// dumb utility, not an implementation choice about the VM.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum VarKind {
    Static,
    Field,
    Arg,
    Var,
}

#[derive(Clone, Debug, PartialEq)]
pub struct SymbolInfo {
    pub name: String,
    pub jack_type: String,
    pub kind: VarKind,
    pub index: u16,
}

/// Maps identifiers to their Jack type, kind, and per-kind running index.
/// One table is kept for class scope (Static/Field) and a second, reset on
/// every subroutine, for subroutine scope (Arg/Var).
#[derive(Default)]
pub struct SymbolTable {
    symbols: HashMap<String, SymbolInfo>,
    kind_counts: HashMap<VarKind, u16>,
}

impl SymbolTable {
    pub fn new() -> SymbolTable {
        SymbolTable::default()
    }

    pub fn reset(&mut self) {
        self.symbols.clear();
        self.kind_counts.clear();
    }

    pub fn define(&mut self, name: &str, jack_type: &str, kind: VarKind) {
        let index = *self.kind_counts.get(&kind).unwrap_or(&0);
        self.kind_counts.insert(kind, index + 1);
        self.symbols.insert(
            name.to_owned(),
            SymbolInfo {
                name: name.to_owned(),
                jack_type: jack_type.to_owned(),
                kind,
                index,
            },
        );
    }

    pub fn var_count(&self, kind: VarKind) -> u16 {
        *self.kind_counts.get(&kind).unwrap_or(&0)
    }

    pub fn has_symbol(&self, name: &str) -> bool {
        self.symbols.contains_key(name)
    }

    pub fn get(&self, name: &str) -> Option<&SymbolInfo> {
        self.symbols.get(name)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn assigns_sequential_indexes_per_kind() {
        let mut table = SymbolTable::new();
        table.define("count", "int", VarKind::Arg);
        table.define("arr", "Array", VarKind::Var);
        table.define("i", "int", VarKind::Var);

        assert_eq!(table.get("count").unwrap().index, 0);
        assert_eq!(table.get("arr").unwrap().index, 0);
        assert_eq!(table.get("i").unwrap().index, 1);
        assert_eq!(table.var_count(VarKind::Var), 2);
        assert_eq!(table.var_count(VarKind::Arg), 1);
    }

    #[test]
    fn reset_clears_symbols_and_counts() {
        let mut table = SymbolTable::new();
        table.define("x", "int", VarKind::Var);
        table.reset();
        assert!(!table.has_symbol("x"));
        assert_eq!(table.var_count(VarKind::Var), 0);
    }
}
