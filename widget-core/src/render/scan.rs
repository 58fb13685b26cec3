//! Finds the helpers a parsed template calls.
//!
//! The engine resolves functions and filters only when a template executes,
//! so a misspelled or unbound helper would otherwise surface on the first
//! request that reaches it. Walking the parsed nodes up front lets a build
//! fail instead.

use indexmap::IndexSet;
use tera::ast::{Expr, ExprVal, FunctionCall, Node};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub(crate) enum HelperKind {
    Function,
    Filter,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub(crate) struct HelperRef {
    pub kind: HelperKind,
    pub name: String,
}

/// Every function and filter called in `ast`, in order of first use.
///
/// Macro bodies count; macro calls, tests and `super()` do not.
pub(crate) fn helper_refs(ast: &[Node]) -> Vec<HelperRef> {
    let mut refs = IndexSet::new();
    visit_nodes(ast, &mut refs);
    refs.into_iter().collect()
}

fn visit_nodes(nodes: &[Node], refs: &mut IndexSet<HelperRef>) {
    for node in nodes {
        match node {
            Node::VariableBlock(_, expr) => visit_expr(expr, refs),
            Node::Set(_, set) => visit_expr(&set.value, refs),
            Node::MacroDefinition(_, def, _) => {
                for default in def.args.values().flatten() {
                    visit_expr(default, refs);
                }
                visit_nodes(&def.body, refs);
            }
            Node::FilterSection(_, section, _) => {
                add(refs, HelperKind::Filter, &section.filter);
                visit_nodes(&section.body, refs);
            }
            Node::Block(_, block, _) => visit_nodes(&block.body, refs),
            Node::Forloop(_, forloop, _) => {
                visit_expr(&forloop.container, refs);
                visit_nodes(&forloop.body, refs);
                if let Some(empty) = &forloop.empty_body {
                    visit_nodes(empty, refs);
                }
            }
            Node::If(branches, _) => {
                for (_, condition, body) in &branches.conditions {
                    visit_expr(condition, refs);
                    visit_nodes(body, refs);
                }
                if let Some((_, body)) = &branches.otherwise {
                    visit_nodes(body, refs);
                }
            }
            Node::Super
            | Node::Text(_)
            | Node::Extends(..)
            | Node::Include(..)
            | Node::ImportMacro(..)
            | Node::Raw(..)
            | Node::Break(_)
            | Node::Continue(_)
            | Node::Comment(..) => {}
        }
    }
}

fn visit_expr(expr: &Expr, refs: &mut IndexSet<HelperRef>) {
    match &expr.val {
        ExprVal::FunctionCall(call) => add(refs, HelperKind::Function, call),
        ExprVal::MacroCall(call) => call.args.values().for_each(|arg| visit_expr(arg, refs)),
        ExprVal::Math(math) => {
            visit_expr(&math.lhs, refs);
            visit_expr(&math.rhs, refs);
        }
        ExprVal::Logic(logic) => {
            visit_expr(&logic.lhs, refs);
            visit_expr(&logic.rhs, refs);
        }
        ExprVal::In(within) => {
            visit_expr(&within.lhs, refs);
            visit_expr(&within.rhs, refs);
        }
        ExprVal::Test(test) => test.args.iter().for_each(|arg| visit_expr(arg, refs)),
        ExprVal::Array(items) => items.iter().for_each(|item| visit_expr(item, refs)),
        ExprVal::StringConcat(concat) => {
            for value in &concat.values {
                visit_expr(&Expr::new(value.clone()), refs);
            }
        }
        ExprVal::String(_)
        | ExprVal::Int(_)
        | ExprVal::Float(_)
        | ExprVal::Bool(_)
        | ExprVal::Ident(_) => {}
    }

    for filter in &expr.filters {
        add(refs, HelperKind::Filter, filter);
    }
}

fn add(refs: &mut IndexSet<HelperRef>, kind: HelperKind, call: &FunctionCall) {
    refs.insert(HelperRef {
        kind,
        name: call.name.clone(),
    });
    for arg in call.args.values() {
        visit_expr(arg, refs);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn refs(source: &str) -> Vec<HelperRef> {
        let template = tera::Template::new("page.html", None, source).unwrap();
        helper_refs(&template.ast)
    }

    fn function(name: &str) -> HelperRef {
        HelperRef {
            kind: HelperKind::Function,
            name: name.into(),
        }
    }

    fn filter(name: &str) -> HelperRef {
        HelperRef {
            kind: HelperKind::Filter,
            name: name.into(),
        }
    }

    #[test]
    fn finds_functions_and_filters() {
        let source = r#"
            {% set clothes = clothe(description=description, celsius=celsius) %}
            <h1>{{ location | title }}</h1>
            <div class="{{ clothes|class_names }}"></div>
            {{ query | default(value="") | urlencode }}
        "#;

        assert_eq!(
            refs(source),
            [
                function("clothe"),
                filter("title"),
                filter("class_names"),
                filter("default"),
                filter("urlencode"),
            ]
        );
    }

    #[test]
    fn ignores_text_strings_and_comments() {
        let source = r#"
            <p>shout(loudly) | quietly</p>
            {{ "clothe(x)" }}
            {# {{ secret(x) }} #}
        "#;

        assert!(refs(source).is_empty());
    }

    #[test]
    fn braces_inside_strings_do_not_end_the_tag() {
        assert_eq!(refs(r#"{{ "}}" ~ text | shout }}"#), [filter("shout")]);
    }

    #[test]
    fn logic_keywords_are_not_calls() {
        let source = "{% if celsius > 0 and (celsius < 30) or (not raining) %}ok{% endif %}";

        assert!(refs(source).is_empty());
    }

    #[test]
    fn ignores_macro_calls_tests_and_raw_blocks() {
        let source = r#"
            {% macro badge(label) %}{{ label }}{% endmacro badge %}
            {{ self::badge(label="x") }}
            {% if celsius is divisibleby(2) %}even{% endif %}
            {% if celsius is not divisibleby(3) %}odd{% endif %}
            {% raw %}{{ shout(x) }}{% endraw %}
        "#;

        assert!(refs(source).is_empty());
    }

    #[test]
    fn looks_inside_macros_loops_and_branches() {
        let source = r#"
            {% macro badge(label) %}{{ label | shout }}{% endmacro badge %}
            {% for item in items | sort %}{{ item | title }}{% else %}{{ nothing() }}{% endfor %}
            {% if show %}{{ a | upper }}{% elif other %}{{ b | lower }}{% else %}{{ c | trim }}{% endif %}
        "#;

        assert_eq!(
            refs(source),
            [
                filter("shout"),
                filter("sort"),
                filter("title"),
                function("nothing"),
                filter("upper"),
                filter("lower"),
                filter("trim"),
            ]
        );
    }

    #[test]
    fn filter_sections_and_nested_arguments() {
        let source = r#"{%- filter shout -%}hi{%- endfilter -%}{{- concat(tokens=[x | upper]) -}}"#;

        assert_eq!(refs(source), [filter("shout"), function("concat"), filter("upper")]);
    }

    #[test]
    fn each_helper_reported_once() {
        let source = "{{ a | title }}{{ b | title }}{{ clothe(x=1) }}{{ clothe(x=2) }}";

        assert_eq!(refs(source), [filter("title"), function("clothe")]);
    }
}
