//! Stage 4: concatenate constant blocks, the three generator outputs and
//! the hack code into the final single-file module.

use crate::config;
use crate::gen::Emitter;
use crate::model::Language;
use crate::payload;
use pegkit::to_pascal_case;
use std::collections::HashMap;

/// Knobs of the emitted module.
#[derive(Debug, Clone)]
pub struct Options {
    /// Package name of the emitted module.
    pub package_name: String,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            package_name: "parser".to_string(),
        }
    }
}

/// Produces the complete emitted module (no trailing-newline guarantee;
/// the caller normalizes).
pub fn assemble(
    lang: &Language,
    ast_src: &str,
    tokenizer_src: &str,
    parser_src: &str,
    options: &Options,
) -> String {
    let mut em = Emitter::new();
    em.put(format!("package {}", options.package_name)).put_nl();
    em.put(payload::IMPORT_CODE).put_nl();
    em.put(payload::POSITION_STRUCT).put_nl();
    em.put(payload::TOKEN_STRUCT).put_nl();
    em.put(payload::NODE_INTERFACE).put_nl();
    token_type_consts(&mut em, lang);
    em.put_nl();
    node_type_consts(&mut em, lang);
    em.put_nl();

    em.put(payload::ERROR_CONTEXT_FUNC).put_nl();
    em.put(payload::TO_SNAKE_CASE_FUNC).put_nl();
    em.put(payload::TO_CAMEL_CASE_FUNC).put_nl();
    em.put(payload::DECODE_BYTES_FUNC).put_nl();
    em.put(payload::TYPE_NAME_OF_FUNC).put_nl();
    em.put(payload::EQUAL_RUNE_FUNC).put_nl();
    em.put(payload::IN_RANGE_FUNC).put_nl();
    em.put(payload::NODES_SET_PARENT_FUNC).put_nl();
    em.put(payload::NODES_VISIT_FUNC).put_nl();
    em.put(payload::CREATION_HOOK_VAR).put_nl();
    em.put(payload::BASE_NODE_STRUCT).put_nl();
    em.put(payload::DUMMY_NODE_VAR).put_nl();
    em.put(payload::NODES_NODE_STRUCT).put_nl();
    em.put(payload::TOKEN_NODE_STRUCT).put_nl();
    em.put(ast_src).put_nl();
    em.put(tokenizer_src).put_nl();
    em.put(parser_src).put_nl();
    em.put(lang.hack_code());
    em.put(payload::DUMP_NODE_FUNC).put_nl();
    em.put(payload::QUERY_NODE_FUNC).put_nl();
    em.put(payload::PARSE_FUNC).put_nl();
    em.finish()
}

fn token_type_consts(em: &mut Emitter, lang: &Language) {
    let mut tokens: Vec<String> = lang
        .token_rules()
        .iter()
        .filter_map(|&rule| {
            let name = &lang.token_tree.node(rule).name;
            if name.starts_with('_') {
                None
            } else {
                Some(name.to_string())
            }
        })
        .collect();
    tokens.sort();

    let mut operators = Vec::new();
    let mut literals: HashMap<String, String> = HashMap::new();
    for (op, name) in lang.operator_name_map() {
        let op_name = format!("op_{name}");
        literals.insert(op_name.clone(), op.clone());
        operators.push(op_name);
    }
    operators.sort();

    let mut keywords: Vec<String> = lang
        .keywords()
        .iter()
        .map(|k| format!("kw_{k}"))
        .collect();
    keywords.sort();

    let mut token_types = vec!["dummy".to_string()];
    token_types.extend(config::BUILTIN_TOKENS.iter().map(|s| s.to_string()));
    token_types.extend(tokens);
    token_types.extend(operators);
    token_types.extend(keywords);

    for t in token_types {
        let value = literals.get(&t).cloned().unwrap_or_else(|| t.clone());
        em.put(format!(
            "const TokenType{} = \"{}\"",
            to_pascal_case(&t),
            value
        ));
    }
}

fn node_type_consts(em: &mut Emitter, lang: &Language) {
    let mut node_types = vec!["dummy", "token", "nodes"];
    for node in lang.ast_nodes() {
        node_types.push(node.name());
    }
    for t in node_types {
        em.put(format!("const NodeType{} = \"{}\"", to_pascal_case(t), t));
    }
}
