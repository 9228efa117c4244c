//! Type dependency graph and resolution
//!
//! Computes a safe emission order over the type graph: for every field held
//! by value, the referenced type must appear strictly before the holder.
//! Reference cycles are detected during the traversal and broken by widening
//! the closing field to optional, turning the by-value edge into a weak
//! reference. Cycle breaking is the pipeline's only non-fatal condition;
//! callers decide how to surface the returned diagnostics.

use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::visit::EdgeRef;
use serde::Serialize;
use std::collections::HashMap;
use std::fmt;

use crate::schema::{Module, TypeDef};

// =============================================================================
// Diagnostics
// =============================================================================

/// One detected reference cycle, reported before it is repaired
#[derive(Debug, Clone, Serialize)]
pub struct CycleDiagnostic {
    /// Types on the traversal stack when the back-edge was found
    pub stack: Vec<String>,
    /// Type holding the closing field
    pub type_name: String,
    /// The field that closes the cycle
    pub field: String,
    /// The field's target type
    pub target: String,
    /// Whether the field was widened to optional (false when it already
    /// carried optional or list storage)
    pub widened: bool,
}

impl fmt::Display for CycleDiagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "type cycle through [{}] at field {}.{} referencing {}",
            self.stack.join(", "),
            self.type_name,
            self.field,
            self.target
        )?;
        if self.widened {
            write!(f, "; field widened to optional")
        } else {
            write!(f, "; field already weak, no change")
        }
    }
}

/// Result of dependency resolution
#[derive(Debug)]
pub struct Resolution {
    /// The module with types in emission order and cycle edges widened
    pub module: Module,
    /// Cycles found (and repaired) during traversal
    pub cycles: Vec<CycleDiagnostic>,
}

// =============================================================================
// Resolver
// =============================================================================

/// Resolve a module into a safe emission order.
///
/// Depth-first traversal over the reference graph with three-state marking,
/// started from every type in declaration order. Every input type appears in
/// the output exactly once; the transformation is idempotent because no
/// cycle survives it.
pub fn resolve(mut module: Module) -> Resolution {
    let count = module.types.len();
    let index: HashMap<String, usize> = module
        .types
        .iter()
        .enumerate()
        .map(|(i, t)| (t.name.clone(), i))
        .collect();

    // One node per type; one edge per field naming a declared type, labelled
    // with the field's declaration index. Optional/list fields still produce
    // edges (the traversal follows them) but never require widening.
    let mut graph: DiGraph<usize, usize> = DiGraph::new();
    let nodes: Vec<NodeIndex> = (0..count).map(|i| graph.add_node(i)).collect();
    for (ti, t) in module.types.iter().enumerate() {
        if let Some(fields) = t.fields() {
            for (fi, f) in fields.iter().enumerate() {
                if let Some(&ui) = index.get(&f.type_name) {
                    graph.add_edge(nodes[ti], nodes[ui], fi);
                }
            }
        }
    }

    let mut walker = Walker {
        graph: &graph,
        nodes: &nodes,
        module: &mut module,
        marks: vec![Mark::Unvisited; count],
        stack: Vec::new(),
        order: Vec::with_capacity(count),
        cycles: Vec::new(),
    };
    for ti in 0..count {
        if walker.marks[ti] == Mark::Unvisited {
            walker.visit(ti);
        }
    }
    let Walker { order, cycles, .. } = walker;

    let mut slots: Vec<Option<TypeDef>> = module.types.drain(..).map(Some).collect();
    module.types = order
        .into_iter()
        .map(|i| slots[i].take().expect("each type ordered exactly once"))
        .collect();

    Resolution { module, cycles }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mark {
    Unvisited,
    InProgress,
    Done,
}

struct Walker<'a> {
    graph: &'a DiGraph<usize, usize>,
    nodes: &'a [NodeIndex],
    module: &'a mut Module,
    marks: Vec<Mark>,
    stack: Vec<usize>,
    order: Vec<usize>,
    cycles: Vec<CycleDiagnostic>,
}

impl Walker<'_> {
    fn visit(&mut self, ti: usize) {
        self.marks[ti] = Mark::InProgress;
        self.stack.push(ti);

        // petgraph iterates adjacency most-recent-first; restore field
        // declaration order through the edge labels
        let mut edges: Vec<(usize, usize)> = self
            .graph
            .edges(self.nodes[ti])
            .map(|e| (*e.weight(), self.graph[e.target()]))
            .collect();
        edges.sort_unstable_by_key(|(fi, _)| *fi);

        for (fi, ui) in edges {
            match self.marks[ui] {
                Mark::Unvisited => self.visit(ui),
                Mark::Done => {}
                Mark::InProgress => self.break_cycle(ti, fi, ui),
            }
        }

        self.stack.pop();
        self.marks[ti] = Mark::Done;
        self.order.push(ti);
    }

    /// A back-edge closes a cycle along the current stack. Widen the closing
    /// field to optional so the target no longer has to be embedded inline.
    /// The target stays in-progress: its remaining fields are still visited
    /// when its own frame resumes, so cycles reachable only through it are
    /// not missed.
    fn break_cycle(&mut self, ti: usize, fi: usize, ui: usize) {
        let widened = {
            let field = &mut self.module.types[ti]
                .fields_mut()
                .expect("edges originate from sequence/choice fields")[fi];
            if field.is_by_value() {
                field.optional = true;
                true
            } else {
                false
            }
        };

        let holder = &self.module.types[ti];
        let field = &holder.fields().expect("checked above")[fi];
        self.cycles.push(CycleDiagnostic {
            stack: self
                .stack
                .iter()
                .map(|&i| self.module.types[i].name.clone())
                .collect(),
            type_name: holder.name.clone(),
            field: field.name.clone(),
            target: self.module.types[ui].name.clone(),
            widened,
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{Field, TypeBody};

    fn field(name: &str, type_name: &str) -> Field {
        Field {
            name: name.into(),
            type_name: type_name.into(),
            optional: false,
            list: false,
            default: None,
        }
    }

    fn sequence(name: &str, fields: Vec<Field>) -> TypeDef {
        TypeDef {
            name: name.into(),
            body: TypeBody::Sequence { fields },
            doc: String::new(),
        }
    }

    fn module(types: Vec<TypeDef>) -> Module {
        Module {
            name: "test".into(),
            doc: String::new(),
            types,
        }
    }

    fn order_of(module: &Module) -> Vec<&str> {
        module.types.iter().map(|t| t.name.as_str()).collect()
    }

    #[test]
    fn orders_dependencies_first() {
        let m = module(vec![
            sequence("Outer", vec![field("mid", "Middle")]),
            sequence("Middle", vec![field("inner", "Inner")]),
            sequence("Inner", vec![field("x", "int")]),
        ]);
        let res = resolve(m);
        assert_eq!(order_of(&res.module), ["Inner", "Middle", "Outer"]);
        assert!(res.cycles.is_empty());
    }

    #[test]
    fn mutual_cycle_widens_exactly_one_edge() {
        let m = module(vec![
            sequence("A", vec![field("b", "B")]),
            sequence("B", vec![field("a", "A")]),
        ]);
        let res = resolve(m);

        assert_eq!(order_of(&res.module), ["B", "A"]);
        assert_eq!(res.cycles.len(), 1);
        let cycle = &res.cycles[0];
        assert_eq!(cycle.stack, ["A", "B"]);
        assert_eq!(cycle.type_name, "B");
        assert_eq!(cycle.field, "a");
        assert_eq!(cycle.target, "A");
        assert!(cycle.widened);

        let b = res.module.get("B").unwrap();
        assert!(b.fields().unwrap()[0].optional, "closing edge widened");
        let a = res.module.get("A").unwrap();
        assert!(
            a.fields().unwrap()[0].is_by_value(),
            "the other edge stays by value"
        );
    }

    #[test]
    fn three_type_cycle_breaks_once() {
        let m = module(vec![
            sequence("A", vec![field("b", "B")]),
            sequence("B", vec![field("c", "C")]),
            sequence("C", vec![field("a", "A")]),
        ]);
        let res = resolve(m);
        assert_eq!(res.cycles.len(), 1);
        let widened: usize = res
            .module
            .types
            .iter()
            .flat_map(|t| t.fields().unwrap())
            .filter(|f| f.optional)
            .count();
        assert_eq!(widened, 1);
        // every type present exactly once
        let mut names = order_of(&res.module);
        names.sort_unstable();
        assert_eq!(names, ["A", "B", "C"]);
    }

    #[test]
    fn already_weak_back_edge_needs_no_widening() {
        let m = module(vec![
            sequence("A", vec![field("b", "B")]),
            sequence(
                "B",
                vec![Field {
                    optional: true,
                    ..field("a", "A")
                }],
            ),
        ]);
        let res = resolve(m);
        assert_eq!(res.cycles.len(), 1);
        assert!(!res.cycles[0].widened);
        assert_eq!(order_of(&res.module), ["B", "A"]);
    }

    #[test]
    fn list_edges_are_traversed_but_never_widened() {
        let m = module(vec![
            sequence("Tree", vec![field("leaf", "Leaf")]),
            sequence(
                "Leaf",
                vec![Field {
                    list: true,
                    ..field("trees", "Tree")
                }],
            ),
        ]);
        let res = resolve(m);
        assert_eq!(res.cycles.len(), 1);
        assert!(!res.cycles[0].widened);
        let leaf = res.module.get("Leaf").unwrap();
        let f = &leaf.fields().unwrap()[0];
        assert!(f.list && !f.optional);
    }

    #[test]
    fn resolution_is_idempotent() {
        let m = module(vec![
            sequence("A", vec![field("b", "B")]),
            sequence("B", vec![field("a", "A")]),
        ]);
        let first = resolve(m);
        let second = resolve(first.module.clone());
        assert!(second.cycles.is_empty(), "no cycle survives resolution");
        assert_eq!(second.module, first.module);
    }

    #[test]
    fn enums_carry_no_ordering_constraints() {
        let m = module(vec![
            sequence("S", vec![field("e", "Color")]),
            TypeDef {
                name: "Color".into(),
                body: TypeBody::Enum { enumerators: vec![] },
                doc: String::new(),
            },
        ]);
        let res = resolve(m);
        assert_eq!(order_of(&res.module), ["Color", "S"]);
    }

    #[test]
    fn declaration_order_kept_when_unconstrained() {
        let m = module(vec![
            sequence("One", vec![field("x", "int")]),
            sequence("Two", vec![field("y", "str")]),
            sequence("Three", vec![field("z", "bool")]),
        ]);
        let res = resolve(m);
        assert_eq!(order_of(&res.module), ["One", "Two", "Three"]);
    }
}
