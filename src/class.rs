//! Class arena and C3 method resolution order.
//!
//! Classes never refer to each other directly: parents and MRO entries are
//! [`ClassId`]s into the [`ClassTable`].  A class's MRO is linearized once,
//! when the class is defined, and is read-only afterwards.

use std::collections::HashMap;
use std::rc::Rc;

use log::{debug, info};

use crate::ast::FunctionDef;
use crate::error::{MlError, Result};

/// Stable index of a class in its [`ClassTable`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ClassId(usize);

#[derive(Debug)]
pub struct ClassRecord {
    pub name: Rc<str>,
    pub parents: Vec<ClassId>,
    pub methods: HashMap<String, Rc<FunctionDef>>,
    /// Starts with the class itself.
    pub mro: Vec<ClassId>,
}

#[derive(Debug, Default)]
pub struct ClassTable {
    classes: Vec<ClassRecord>,
}

impl ClassTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a class and compute its MRO.  Nothing is stored when the
    /// hierarchy cannot be linearized.
    pub fn define(
        &mut self,
        name: &str,
        parents: Vec<ClassId>,
        methods: HashMap<String, Rc<FunctionDef>>,
    ) -> Result<ClassId> {
        let id: ClassId = ClassId(self.classes.len());
        let mro: Vec<ClassId> = self.linearize(id, name, &parents)?;

        info!(
            "Defined class '{}' with MRO [{}]",
            name,
            self.render_mro(&mro, name)
        );

        self.classes.push(ClassRecord {
            name: Rc::from(name),
            parents,
            methods,
            mro,
        });

        Ok(id)
    }

    pub fn get(&self, id: ClassId) -> &ClassRecord {
        &self.classes[id.0]
    }

    pub fn name(&self, id: ClassId) -> Rc<str> {
        self.get(id).name.clone()
    }

    pub fn mro(&self, id: ClassId) -> &[ClassId] {
        &self.get(id).mro
    }

    /// First class in `id`'s MRO whose own method table has `name`.
    pub fn find_method(&self, id: ClassId, name: &str) -> Option<(Rc<FunctionDef>, ClassId)> {
        self.search(self.mro(id), name)
    }

    /// Continue a method search in `instance_class`'s MRO strictly after
    /// `defining_class`.  `None` when `defining_class` is not in that MRO or
    /// nothing further along defines `name`.
    pub fn find_method_after(
        &self,
        instance_class: ClassId,
        defining_class: ClassId,
        name: &str,
    ) -> Option<(Rc<FunctionDef>, ClassId)> {
        let mro: &[ClassId] = self.mro(instance_class);
        let pos: usize = mro.iter().position(|c| *c == defining_class)?;

        self.search(&mro[pos + 1..], name)
    }

    fn search(&self, order: &[ClassId], name: &str) -> Option<(Rc<FunctionDef>, ClassId)> {
        order.iter().find_map(|c: &ClassId| {
            self.get(*c)
                .methods
                .get(name)
                .map(|method| (method.clone(), *c))
        })
    }

    /// C3 merge of the parents' MROs followed by the parent list itself.
    fn linearize(&self, id: ClassId, name: &str, parents: &[ClassId]) -> Result<Vec<ClassId>> {
        let mut seqs: Vec<Vec<ClassId>> = parents
            .iter()
            .map(|p: &ClassId| self.mro(*p).to_vec())
            .collect();
        seqs.push(parents.to_vec());

        let mut result: Vec<ClassId> = vec![id];

        loop {
            seqs.retain(|s| !s.is_empty());

            if seqs.is_empty() {
                return Ok(result);
            }

            let head: Option<ClassId> = seqs
                .iter()
                .map(|s| s[0])
                .find(|candidate| !seqs.iter().any(|s| s[1..].contains(candidate)));

            let Some(head) = head else {
                return Err(MlError::untagged(format!(
                    "Cannot create a consistent method resolution order (MRO) for class '{}': inconsistent hierarchy",
                    name
                )));
            };

            debug!("C3 merge for '{}' selected {:?}", name, head);

            result.push(head);

            for seq in seqs.iter_mut() {
                if seq[0] == head {
                    seq.remove(0);
                }
            }
        }
    }

    fn render_mro(&self, mro: &[ClassId], own_name: &str) -> String {
        mro.iter()
            .map(|c: &ClassId| {
                if c.0 == self.classes.len() {
                    own_name.to_owned()
                } else {
                    self.name(*c).to_string()
                }
            })
            .collect::<Vec<_>>()
            .join(", ")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn method(name: &str) -> (String, Rc<FunctionDef>) {
        let def = FunctionDef {
            name: name.to_owned(),
            params: Vec::new(),
            body: Vec::new(),
            line: 1,
        };

        (name.to_owned(), Rc::new(def))
    }

    fn empty(table: &mut ClassTable, name: &str, parents: Vec<ClassId>) -> ClassId {
        table.define(name, parents, HashMap::new()).unwrap()
    }

    #[test]
    fn diamond_linearizes_in_local_precedence_order() {
        let mut table = ClassTable::new();
        let a = empty(&mut table, "A", vec![]);
        let b = empty(&mut table, "B", vec![a]);
        let c = empty(&mut table, "C", vec![a]);
        let d = empty(&mut table, "D", vec![b, c]);

        assert_eq!(table.mro(d), &[d, b, c, a]);
        assert_eq!(&*table.name(table.mro(d)[1]), "B");
    }

    #[test]
    fn conflicting_precedence_is_rejected() {
        let mut table = ClassTable::new();
        let x = empty(&mut table, "X", vec![]);
        let y = empty(&mut table, "Y", vec![]);
        let a = empty(&mut table, "A", vec![x, y]);
        let b = empty(&mut table, "B", vec![y, x]);

        let err = table.define("Z", vec![a, b], HashMap::new()).unwrap_err();

        assert!(err.to_string().contains("inconsistent hierarchy"));
        assert!(err.to_string().contains("'Z'"));
    }

    #[test]
    fn repeated_parent_is_rejected() {
        let mut table = ClassTable::new();
        let a = empty(&mut table, "A", vec![]);

        assert!(table.define("B", vec![a, a], HashMap::new()).is_err());
    }

    #[test]
    fn parent_listed_before_its_own_base_is_rejected() {
        let mut table = ClassTable::new();
        let a = empty(&mut table, "A", vec![]);
        let b = empty(&mut table, "B", vec![a]);

        assert!(table.define("C", vec![a, b], HashMap::new()).is_err());
    }

    #[test]
    fn lookup_resumes_after_defining_class() {
        let mut table = ClassTable::new();
        let a = table
            .define("A", vec![], HashMap::from([method("greet")]))
            .unwrap();
        let b = table
            .define("B", vec![a], HashMap::from([method("greet")]))
            .unwrap();
        let c = table
            .define("C", vec![a], HashMap::from([method("greet")]))
            .unwrap();
        let d = empty(&mut table, "D", vec![b, c]);

        assert_eq!(table.find_method(d, "greet").map(|(_, at)| at), Some(b));
        assert_eq!(
            table.find_method_after(d, b, "greet").map(|(_, at)| at),
            Some(c)
        );
        assert_eq!(
            table.find_method_after(d, c, "greet").map(|(_, at)| at),
            Some(a)
        );
        assert!(table.find_method_after(d, a, "greet").is_none());
        assert!(table.find_method(d, "missing").is_none());
    }
}
