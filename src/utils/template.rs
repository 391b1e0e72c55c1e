//! String template rendering utilities.

pub struct TemplateVars;

impl TemplateVars {
    pub const NAME: &'static str = "name";
}

/// Replace every `{{key}}` placeholder with its value.
pub fn render(template: &str, variables: &[(&str, &str)]) -> String {
    let mut result = template.to_string();

    for (key, value) in variables {
        let placeholder = format!("{{{{{}}}}}", key);
        result = result.replace(&placeholder, value);
    }

    result
}

pub fn is_present(template: &str, key: &str) -> bool {
    let placeholder = format!("{{{{{}}}}}", key);
    template.contains(&placeholder)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn render_replaces_all_occurrences() {
        let out = render(
            "git@host:{{name}}/{{name}}.git",
            &[(TemplateVars::NAME, "site")],
        );
        assert_eq!(out, "git@host:site/site.git");
    }

    #[test]
    fn is_present_detects_placeholder() {
        assert!(is_present("x/{{name}}.git", TemplateVars::NAME));
        assert!(!is_present("x/name.git", TemplateVars::NAME));
    }
}
