//! Page rendering entry points.
//!
//! `render_page` is the per-page driver: it runs the dependency
//! barrier, initializes the root SVG, and hands the flattened operator
//! tree to the interpreter. `render_pages` fans a document's pages out
//! over a rayon pool; a failed page is reported in its slot and never
//! stops its siblings.

use rayon::prelude::*;

use crate::dom::SvgDocument;
use crate::error::Result;
use crate::interp::{IdCounters, RenderOptions, SvgPageInterpreter};
use crate::model::Viewport;
use crate::ops::{op_list_to_tree, OperatorList};
use crate::store::{ensure_dependencies, ObjectStore};

/// Renders one page's operator list into a standalone SVG document.
pub fn render_page(
    operator_list: &OperatorList,
    viewport: &Viewport,
    common_objs: &ObjectStore,
    page_objs: &ObjectStore,
    options: RenderOptions,
    counters: &IdCounters,
) -> Result<SvgDocument> {
    ensure_dependencies(operator_list, common_objs, page_objs)?;

    let mut interpreter = SvgPageInterpreter::new(
        viewport.clone(),
        common_objs,
        page_objs,
        options,
        counters,
    )?;
    let tree = op_list_to_tree(operator_list);
    interpreter.execute_op_tree(&tree)?;
    Ok(interpreter.into_document())
}

/// One page's worth of render input.
#[derive(Debug)]
pub struct PageTask {
    pub operator_list: OperatorList,
    pub viewport: Viewport,
    pub objects: ObjectStore,
}

/// Renders a document's pages in parallel, preserving page order in the
/// result vector.
pub fn render_pages(
    tasks: &[PageTask],
    common_objs: &ObjectStore,
    options: RenderOptions,
    counters: &IdCounters,
) -> Vec<Result<SvgDocument>> {
    tasks
        .par_iter()
        .map(|task| {
            render_page(
                &task.operator_list,
                &task.viewport,
                common_objs,
                &task.objects,
                options,
                counters,
            )
        })
        .collect()
}
