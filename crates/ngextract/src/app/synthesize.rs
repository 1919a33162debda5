//! Rendering the source of the extracted component.

use std::fs;
use std::path::Path;

use minijinja::{AutoEscape, Environment};
use serde::Serialize;

use crate::domain::errors::ExtractError;
use crate::domain::model::{ComponentNames, SynthesizedFile};

/// Name of the built-in template producing a standalone Angular component.
pub const DEFAULT_TEMPLATE: &str = "angular_component";

/// Options controlling the synthesized file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SynthesizeOptions {
    /// Module the base `Component` decorator is imported from.
    pub import_source: String,
    /// Built-in template name or a path to a template file.
    pub template: String,
    pub file_extension: String,
}

impl Default for SynthesizeOptions {
    fn default() -> Self {
        Self {
            import_source: "@angular/core".into(),
            template: DEFAULT_TEMPLATE.into(),
            file_extension: "ts".into(),
        }
    }
}

/// Renders component files from templates. Output depends only on the inputs.
pub struct Synthesizer {
    env: Environment<'static>,
}

impl Synthesizer {
    pub fn new() -> Result<Self, ExtractError> {
        Ok(Self {
            env: default_environment()?,
        })
    }

    /// Render the component source embedding `selected_text` verbatim.
    pub fn synthesize(
        &self,
        names: &ComponentNames,
        selected_text: &str,
        options: &SynthesizeOptions,
    ) -> Result<String, ExtractError> {
        let context = TemplateContext {
            identifier: names.identifier.as_str(),
            symbolic_name: &names.symbolic_name,
            selector: &names.selector,
            file_base_name: &names.file_base_name,
            import_source: &options.import_source,
            selected_text,
        };
        self.render_with_template(&context, &options.template)
    }

    /// Render the component and place it next to `enclosing_path`.
    pub fn synthesize_file(
        &self,
        names: &ComponentNames,
        selected_text: &str,
        enclosing_path: &Path,
        options: &SynthesizeOptions,
    ) -> Result<SynthesizedFile, ExtractError> {
        let content = self.synthesize(names, selected_text, options)?;
        Ok(SynthesizedFile {
            path: component_path(enclosing_path, names, &options.file_extension),
            content,
        })
    }

    fn render_with_template(
        &self,
        context: &TemplateContext<'_>,
        template_name: &str,
    ) -> Result<String, ExtractError> {
        if let Ok(template) = self.env.get_template(template_name) {
            return template.render(context).map_err(|err| {
                ExtractError::Template(format!("failed to render '{template_name}': {err}"))
            });
        }

        let template_path = Path::new(template_name);
        if template_path.exists() {
            let source = fs::read_to_string(template_path).map_err(|err| {
                ExtractError::Template(format!(
                    "failed to load template from {}: {err}",
                    template_path.display()
                ))
            })?;
            let mut env = Environment::new();
            configure(&mut env);
            env.add_template("external", &source).map_err(|err| {
                ExtractError::Template(format!("invalid template '{template_name}': {err}"))
            })?;
            let template = env.get_template("external").map_err(|err| {
                ExtractError::Template(format!("invalid template '{template_name}': {err}"))
            })?;
            return template.render(context).map_err(|err| {
                ExtractError::Template(format!("failed to render '{template_name}': {err}"))
            });
        }

        Err(ExtractError::Template(format!(
            "template '{template_name}' not found (built-in or filesystem)"
        )))
    }
}

/// Location of the new component: same directory as the enclosing file.
pub fn component_path(
    enclosing_path: &Path,
    names: &ComponentNames,
    extension: &str,
) -> std::path::PathBuf {
    let dir = enclosing_path.parent().unwrap_or_else(|| Path::new(""));
    let file_name = if extension.is_empty() {
        names.file_base_name.clone()
    } else {
        format!("{}.{}", names.file_base_name, extension.trim_start_matches('.'))
    };
    dir.join(file_name)
}

fn configure(env: &mut Environment<'_>) {
    env.set_keep_trailing_newline(true);
    env.set_auto_escape_callback(|_| AutoEscape::None);
}

fn default_environment() -> Result<Environment<'static>, ExtractError> {
    let mut env = Environment::new();
    configure(&mut env);
    env.add_template(DEFAULT_TEMPLATE, ANGULAR_COMPONENT_TEMPLATE)
        .map_err(|err| {
            ExtractError::Template(format!("failed to register default template: {err}"))
        })?;
    Ok(env)
}

#[derive(Serialize)]
struct TemplateContext<'a> {
    identifier: &'a str,
    symbolic_name: &'a str,
    selector: &'a str,
    file_base_name: &'a str,
    import_source: &'a str,
    selected_text: &'a str,
}

const ANGULAR_COMPONENT_TEMPLATE: &str = "import { Component } from '{{ import_source }}';

@Component({
\tselector: '{{ selector }}',
\ttemplate: `
\t\t{{ selected_text }}
\t`,
\tstandalone: true
})
export class {{ symbolic_name }} {
}
";

#[cfg(test)]
mod tests {
    use super::*;

    use crate::app::naming::{NamingOptions, derive};
    use crate::domain::model::Identifier;

    fn names(raw: &str) -> ComponentNames {
        derive(&Identifier::parse(raw).unwrap(), &NamingOptions::default())
    }

    #[test]
    fn renders_standalone_component() {
        let synthesizer = Synthesizer::new().unwrap();
        let content = synthesizer
            .synthesize(&names("foo-bar"), "<p>hi</p>", &SynthesizeOptions::default())
            .unwrap();

        assert!(content.starts_with("import { Component } from '@angular/core';\n\n"));
        assert!(content.contains("\tselector: 'app-foo-bar',\n"));
        assert!(content.contains("\ttemplate: `\n\t\t<p>hi</p>\n\t`,\n"));
        assert!(content.contains("\tstandalone: true\n})\n"));
        assert!(content.ends_with("export class FooBarComponent {\n}\n"));
    }

    #[test]
    fn embeds_markup_without_escaping() {
        let synthesizer = Synthesizer::new().unwrap();
        let selected = "<a [href]=\"url\" title='x & y'>{{ label }}</a>";
        let content = synthesizer
            .synthesize(&names("link"), selected, &SynthesizeOptions::default())
            .unwrap();
        assert!(content.contains(selected));
    }

    #[test]
    fn output_is_deterministic() {
        let synthesizer = Synthesizer::new().unwrap();
        let options = SynthesizeOptions::default();
        let first = synthesizer.synthesize(&names("a-b"), "<b>x</b>", &options).unwrap();
        let second = synthesizer.synthesize(&names("a-b"), "<b>x</b>", &options).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn honours_import_source() {
        let synthesizer = Synthesizer::new().unwrap();
        let options = SynthesizeOptions {
            import_source: "@custom/core".into(),
            ..SynthesizeOptions::default()
        };
        let content = synthesizer.synthesize(&names("x"), "", &options).unwrap();
        assert!(content.starts_with("import { Component } from '@custom/core';"));
    }

    #[test]
    fn renders_external_template() {
        let dir = tempfile::tempdir().unwrap();
        let template = dir.path().join("component.jinja");
        fs::write(&template, "// {{ symbolic_name }} <{{ selector }}>\n{{ selected_text }}\n")
            .unwrap();

        let synthesizer = Synthesizer::new().unwrap();
        let options = SynthesizeOptions {
            template: template.display().to_string(),
            ..SynthesizeOptions::default()
        };
        let content = synthesizer.synthesize(&names("x-y"), "<i></i>", &options).unwrap();
        assert_eq!(content, "// XYComponent <app-x-y>\n<i></i>\n");
    }

    #[test]
    fn unknown_template_is_an_error() {
        let synthesizer = Synthesizer::new().unwrap();
        let options = SynthesizeOptions {
            template: "does/not/exist.jinja".into(),
            ..SynthesizeOptions::default()
        };
        let err = synthesizer.synthesize(&names("x"), "", &options).unwrap_err();
        assert!(matches!(err, ExtractError::Template(_)));
    }

    #[test]
    fn file_lands_next_to_enclosing_source() {
        let synthesizer = Synthesizer::new().unwrap();
        let file = synthesizer
            .synthesize_file(
                &names("foo-bar"),
                "<p></p>",
                Path::new("src/app/home/home.component.ts"),
                &SynthesizeOptions::default(),
            )
            .unwrap();
        assert_eq!(
            file.path,
            Path::new("src/app/home").join("foo-bar.component.ts")
        );
    }
}
