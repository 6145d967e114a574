//! Page-local and document-wide object stores.
//!
//! The upstream producer preloads every object a page depends on; after
//! the [`ensure_dependencies`] barrier all lookups are synchronous.

use std::collections::HashMap;
use std::sync::Arc;

use crate::error::{RenderError, Result};
use crate::model::{FontObject, ImageData};
use crate::ops::{OpArg, OpCode, OperatorList};

/// A resolved object behind a string identifier.
#[derive(Debug, Clone, PartialEq)]
pub enum StoreObject {
    Font(FontObject),
    Image(ImageData),
}

/// Key -> value dictionary of resolved objects.
///
/// Identifiers beginning with `g_` belong to the document-wide store,
/// everything else to the owning page's store.
#[derive(Debug, Default)]
pub struct ObjectStore {
    objects: HashMap<String, Arc<StoreObject>>,
}

impl ObjectStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, id: impl Into<String>, obj: StoreObject) {
        self.objects.insert(id.into(), Arc::new(obj));
    }

    pub fn get(&self, id: &str) -> Option<Arc<StoreObject>> {
        self.objects.get(id).cloned()
    }

    pub fn contains(&self, id: &str) -> bool {
        self.objects.contains_key(id)
    }

    pub fn len(&self) -> usize {
        self.objects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.objects.is_empty()
    }
}

/// Whether an identifier resolves against the document-wide store.
pub fn is_common_ref(id: &str) -> bool {
    id.starts_with("g_")
}

/// Resolves an identifier against the store its prefix selects.
pub fn lookup(
    id: &str,
    common_objs: &ObjectStore,
    page_objs: &ObjectStore,
) -> Option<Arc<StoreObject>> {
    if is_common_ref(id) {
        common_objs.get(id)
    } else {
        page_objs.get(id)
    }
}

/// The dependency barrier: verifies that every object referenced by a
/// `dependency` operator (including inside nested tiling lists) has been
/// preloaded into its store.
pub fn ensure_dependencies(
    list: &OperatorList,
    common_objs: &ObjectStore,
    page_objs: &ObjectStore,
) -> Result<()> {
    for (op, args) in list.iter() {
        if op == OpCode::Dependency {
            for arg in args {
                check_dependency_arg(arg, common_objs, page_objs)?;
            }
        }
        for arg in args {
            if let OpArg::Ops(nested) = arg {
                ensure_dependencies(nested, common_objs, page_objs)?;
            } else if let OpArg::Array(items) = arg {
                for item in items {
                    if let OpArg::Ops(nested) = item {
                        ensure_dependencies(nested, common_objs, page_objs)?;
                    }
                }
            }
        }
    }
    Ok(())
}

fn check_dependency_arg(
    arg: &OpArg,
    common_objs: &ObjectStore,
    page_objs: &ObjectStore,
) -> Result<()> {
    match arg {
        OpArg::Str(id) => {
            if lookup(id, common_objs, page_objs).is_none() {
                return Err(RenderError::MissingDependency(id.clone()));
            }
            Ok(())
        }
        OpArg::Array(items) => {
            for item in items {
                check_dependency_arg(item, common_objs, page_objs)?;
            }
            Ok(())
        }
        _ => Ok(()),
    }
}
