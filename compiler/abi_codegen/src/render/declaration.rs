//! Public headers re-declaring plain definitions.

use abi_ir::{include_path, Declaration, GenError, Resource, ResourceId};

use super::includes_list;
use crate::template::TemplateKind;
use crate::{Artifact, Generator};

/// Captured definition text of a resource, without a trailing `;`.
pub(crate) fn definition_text(resource: &Resource) -> &str {
    match &resource.declaration {
        Declaration::Class(class) | Declaration::Union(class) => class.text(&resource.source),
        Declaration::Enum(decl) => &decl.text,
        Declaration::Flags(block) => &block.declaration,
    }
}

impl Generator<'_> {
    /// Import header of a data class, enum, union or flags resource.
    pub(crate) fn render_declaration(&self, id: ResourceId) -> Result<Artifact, GenError> {
        let resource = self.resource(id);
        tracing::debug!(
            name = %resource.qualified_name(),
            kind = %resource.kind,
            "re-declaring plain definition"
        );
        let contents = self.import_header(resource, definition_text(resource))?;
        Ok(Artifact {
            path: resource.api_header_path.clone(),
            contents,
        })
    }

    /// Import header wrapping `declaration` in the resource's namespace.
    pub(crate) fn import_header(
        &self,
        resource: &Resource,
        declaration: &str,
    ) -> Result<String, GenError> {
        let guard = format!("{}_H", resource.type_id_name());
        let includes = includes_list(resource.includes.iter().map(String::as_str));
        self.render(
            TemplateKind::ImportHeader,
            &[
                ("guard", &guard),
                ("includes", &includes),
                ("namespace", &resource.namespace.name),
                ("declaration", declaration),
            ],
        )
    }
}

/// `#include` path of the public header of `resource`.
pub(crate) fn api_include(resource: &Resource) -> String {
    include_path(&resource.api_header_path)
}
