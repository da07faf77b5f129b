//! Stage 3c: emit the typed AST structs — one interface, constructor,
//! struct, accessor family and traversal/dump implementation per
//! declared node.

use crate::gen::Emitter;
use crate::model::{AstNodeDef, Language};
use pegkit::{to_pascal_case, Name};

fn padding(count: usize) -> String {
    " ".repeat(count)
}

/// Generates the AST block.
pub fn generate(lang: &Language) -> String {
    let mut em = Emitter::new();
    for node in lang.ast_nodes() {
        interface_code(&mut em, node);
    }
    for node in lang.ast_nodes() {
        node_code(&mut em, node);
    }
    em.finish()
}

fn interface_code(em: &mut Emitter, node: &AstNodeDef) {
    em.put(format!("type I{}Node interface {{", to_pascal_case(node.name())));
    em.push();
    em.put("Node");
    for field in node.fields() {
        em.put(format!("{}() Node", field.pascal()));
        em.put(format!("Set{}(v Node)", field.pascal()));
    }
    em.pop();
    em.put("}");
    em.put_nl();
}

fn node_code(em: &mut Emitter, node: &AstNodeDef) {
    let pascal_name = to_pascal_case(node.name());
    let fields: &[Name] = node.fields();
    let max_len = fields.iter().map(|f| f.camel().len()).max().unwrap_or(0);
    let max_len8 = max_len.max(8);

    // constructor
    let params: String = fields
        .iter()
        .map(|f| format!("{} Node, ", f.camel()))
        .collect();
    em.put(format!(
        "func New{pascal_name}Node(filePath string, fileContent []rune, {params}start, end Position) Node {{"
    ));
    em.push();
    for field in fields {
        em.put(format!("if {} == nil {{", field.camel()));
        em.push();
        em.put(format!("{} = dummyNode", field.camel()));
        em.pop();
        em.put("}");
    }
    em.put(format!("ret := &{pascal_name}Node{{"));
    em.push();
    em.put(format!(
        "BaseNode:{} NewBaseNode(filePath, fileContent, NodeType{}, start, end),",
        padding(max_len8 - 8),
        pascal_name
    ));
    for field in fields {
        let name = field.camel();
        em.put(format!("{}:{} {},", name, padding(max_len8 - name.len()), name));
    }
    em.pop();
    em.put("}");
    em.put("creationHook(ret)");
    em.put("return ret");
    em.pop();
    em.put("}");
    em.put_nl();

    // struct
    em.put(format!("type {pascal_name}Node struct {{"));
    em.push();
    em.put("*BaseNode");
    for field in fields {
        let name = field.camel();
        em.put(format!("{}{} Node", name, padding(max_len - name.len())));
    }
    em.pop();
    em.put("}");
    em.put_nl();

    // accessors
    for field in fields {
        em.put(format!(
            "func (n *{pascal_name}Node) {}() Node {{",
            field.pascal()
        ));
        em.push();
        em.put(format!("return n.{}", field.camel()));
        em.pop();
        em.put("}");
        em.put_nl();
        em.put(format!(
            "func (n *{pascal_name}Node) Set{}(v Node) {{",
            field.pascal()
        ));
        em.push();
        em.put(format!("n.{} = v", field.camel()));
        em.pop();
        em.put("}");
        em.put_nl();
    }

    // BuildLink
    em.put(format!("func (n *{pascal_name}Node) BuildLink() {{"));
    em.push();
    for field in fields {
        em.put(format!("if !n.{}().IsDummy() {{", field.pascal()));
        em.push();
        em.put(format!("{} := n.{}()", field.camel(), field.pascal()));
        em.put(format!("{}.BuildLink()", field.camel()));
        em.put(format!("{}.SetParent(n)", field.camel()));
        em.put(format!(
            "{}.SetSelfField(\"{}\")",
            field.camel(),
            field.normal()
        ));
        em.put(format!("{}.SetReplaceSelf(func(n Node) {{", field.camel()));
        em.push();
        em.put(format!(
            "n.Parent().(I{}Node).Set{}(n)",
            pascal_name,
            field.pascal()
        ));
        em.pop();
        em.put("})");
        em.pop();
        em.put("}");
    }
    em.pop();
    em.put("}");
    em.put_nl();

    // Fields
    if !fields.is_empty() {
        em.put(format!("func (n *{pascal_name}Node) Fields() []string {{"));
        em.push();
        em.put("return []string{");
        em.push();
        for field in fields {
            em.put(format!("\"{}\",", field.normal()));
        }
        em.pop();
        em.put("}");
        em.pop();
        em.put("}");
        em.put_nl();
    }

    // Child
    em.put(format!(
        "func (n *{pascal_name}Node) Child(field string) Node {{"
    ));
    em.push();
    em.put("if field == \"\" {");
    em.push();
    em.put("return nil");
    em.pop();
    em.put("}");
    for field in fields {
        em.put(format!("if field == \"{}\" {{", field.normal()));
        em.push();
        em.put(format!("return n.{}()", field.pascal()));
        em.pop();
        em.put("}");
    }
    em.put("return nil");
    em.pop();
    em.put("}");
    em.put_nl();

    // SetChild
    em.put(format!(
        "func (n *{pascal_name}Node) SetChild(nodes []Node) {{"
    ));
    em.push();
    em.put(format!("if len(nodes) != {} {{", fields.len()));
    em.push();
    em.put("return");
    em.pop();
    em.put("}");
    for (i, field) in fields.iter().enumerate() {
        em.put(format!(
            "n.Set{}(nodes[{}])",
            to_pascal_case(field.normal()),
            i
        ));
    }
    em.pop();
    em.put("}");
    em.put_nl();

    // Fork
    em.put(format!("func (n *{pascal_name}Node) Fork() Node {{"));
    em.push();
    em.put(format!("_ret := &{pascal_name}Node{{"));
    em.push();
    em.put(format!(
        "BaseNode:{} n.BaseNode.fork(),",
        padding(max_len8 - 8)
    ));
    for field in fields {
        let name = field.camel();
        em.put(format!(
            "{}:{} n.{}.Fork(),",
            name,
            padding(max_len8 - name.len()),
            name
        ));
    }
    em.pop();
    em.put("}");
    for field in fields {
        em.put(format!("_ret.{}.SetParent(_ret)", field.camel()));
    }
    em.put("return _ret");
    em.pop();
    em.put("}");
    em.put_nl();

    // Visit
    em.put(format!(
        "func (n *{pascal_name}Node) Visit(beforeChildren func(node Node) (visitChildren, exit bool), afterChildren func(node Node) (exit bool)) (exit bool) {{"
    ));
    em.push();
    em.put("vc, e := beforeChildren(n)");
    em.put("if e {");
    em.push();
    em.put("return true");
    em.pop();
    em.put("}");
    em.put("if !vc {");
    em.push();
    em.put("return false");
    em.pop();
    em.put("}");
    for field in fields {
        em.put(format!(
            "if n.{}.Visit(beforeChildren, afterChildren) {{",
            field.camel()
        ));
        em.push();
        em.put("return true");
        em.pop();
        em.put("}");
    }
    em.put("if afterChildren(n) {");
    em.push();
    em.put("return true");
    em.pop();
    em.put("}");
    em.put("return false");
    em.pop();
    em.put("}");
    em.put_nl();

    // Dump
    let hook_param = if fields.is_empty() { "_" } else { "hook" };
    em.put(format!(
        "func (n *{pascal_name}Node) Dump({hook_param} func(Node, map[string]string) string) map[string]string {{"
    ));
    em.push();
    em.put("ret := make(map[string]string)");
    em.put(format!("ret[\"kind\"] = \"\\\"{}\\\"\"", node.name()));
    for field in fields {
        em.put(format!(
            "ret[\"{}\"] = dumpNode(n.{}(), hook)",
            field.normal(),
            field.pascal()
        ));
    }
    em.put("return ret");
    em.pop();
    em.put("}");
    em.put_nl();
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Language;
    use pegkit::Snippet;

    fn ast_for(defs: &[(&str, &[&str])]) -> String {
        let mut lang = Language::new();
        let snippet = Snippet::new("", "");
        for (name, fields) in defs {
            lang.add_ast_node(AstNodeDef::new(name, fields, snippet.clone()));
        }
        generate(&lang)
    }

    #[test]
    fn interface_lists_getter_and_setter_per_field() {
        let out = ast_for(&[("binary", &["x", "op", "y"])]);
        assert!(out.contains("type IBinaryNode interface {"));
        assert!(out.contains("\tX() Node"));
        assert!(out.contains("\tSetX(v Node)"));
        assert!(out.contains("\tOp() Node"));
        assert!(out.contains("\tSetOp(v Node)"));
        assert!(out.contains("\tY() Node"));
        assert!(out.contains("\tSetY(v Node)"));
    }

    #[test]
    fn constructor_substitutes_dummy_and_hooks() {
        let out = ast_for(&[("binary", &["x", "op", "y"])]);
        assert!(out.contains(
            "func NewBinaryNode(filePath string, fileContent []rune, x Node, op Node, y Node, start, end Position) Node {"
        ));
        assert!(out.contains("if x == nil {"));
        assert!(out.contains("x = dummyNode"));
        assert!(out.contains("creationHook(ret)"));
    }

    #[test]
    fn fields_in_declaration_order() {
        let out = ast_for(&[("binary", &["x", "op", "y"])]);
        let idx = out.find("func (n *BinaryNode) Fields() []string {").unwrap();
        let tail = &out[idx..];
        let x = tail.find("\"x\",").unwrap();
        let op = tail.find("\"op\",").unwrap();
        let y = tail.find("\"y\",").unwrap();
        assert!(x < op && op < y);
    }

    #[test]
    fn build_link_wires_parent_field_and_replace_self() {
        let out = ast_for(&[("binary", &["x", "op", "y"])]);
        assert!(out.contains("func (n *BinaryNode) BuildLink() {"));
        assert!(out.contains("if !n.X().IsDummy() {"));
        assert!(out.contains("x.SetParent(n)"));
        assert!(out.contains("x.SetSelfField(\"x\")"));
        assert!(out.contains("n.Parent().(IBinaryNode).SetX(n)"));
    }

    #[test]
    fn fieldless_node_omits_fields_and_anonymizes_hook() {
        let out = ast_for(&[("marker", &[])]);
        assert!(!out.contains("func (n *MarkerNode) Fields()"));
        assert!(out.contains(
            "func (n *MarkerNode) Dump(_ func(Node, map[string]string) string) map[string]string {"
        ));
        assert!(out.contains("ret[\"kind\"] = \"\\\"marker\\\"\""));
    }

    #[test]
    fn reserved_field_names_get_rewritten() {
        let out = ast_for(&[("loop", &["type", "len"])]);
        assert!(out.contains("return n.type_"));
        assert!(out.contains("func (n *LoopNode) Type() Node {"));
        assert!(out.contains("n.Parent().(ILoopNode).SetLen(n)"));
        assert!(out.contains("type_.SetSelfField(\"type_\")"));
    }

    #[test]
    fn fork_reparents_every_child() {
        let out = ast_for(&[("binary", &["x", "op", "y"])]);
        assert!(out.contains("func (n *BinaryNode) Fork() Node {"));
        assert!(out.contains("x:        n.x.Fork(),"));
        assert!(out.contains("_ret.x.SetParent(_ret)"));
        assert!(out.contains("_ret.y.SetParent(_ret)"));
    }

    #[test]
    fn set_child_guards_on_length() {
        let out = ast_for(&[("binary", &["x", "op", "y"])]);
        assert!(out.contains("if len(nodes) != 3 {"));
        assert!(out.contains("n.SetX(nodes[0])"));
        assert!(out.contains("n.SetY(nodes[2])"));
    }
}
