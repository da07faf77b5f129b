//! End-to-end generation scenarios asserting on the emitted module text.

use peggen::{generate, GenerateError};

fn init_logger() {
    let _ = env_logger::builder().is_test(true).try_init();
}

fn spec(
    tokens: &str,
    keywords: &str,
    operators: &str,
    nodes: &str,
    grammars: &str,
    hack: &str,
) -> String {
    let divider = format!("{}\n", "-".repeat(120));
    [tokens, keywords, operators, nodes, grammars, hack].join(&divider)
}

#[test]
fn minimal_language_end_to_end() {
    init_logger();
    let text = spec(
        "newline: | '\\n'\n",
        "if\n",
        "==\n",
        "",
        "file: | 'if' {_}\n",
        "",
    );
    let out = generate(&text).unwrap();

    assert!(out.contains("const TokenTypeNewline = \"newline\""));
    assert!(out.contains("const TokenTypeOpEqualEqual = \"==\""));
    assert!(out.contains("const TokenTypeKwIf = \"kw_if\""));

    // a single root arm in the operator switch
    assert!(out.contains("case '=':"));
    assert_eq!(out.matches("\tcase '").count(), 1);
    assert!(out.contains("kind = TokenTypeOpEqualEqual"));

    // file() consumes the keyword and yields the dummy node
    assert!(out.contains("func (ps *Parser) file() Node {"));
    assert!(out.contains("_1 = ps._expectK(TokenTypeKwIf)"));
    assert!(out.contains("return dummyNode"));

    // the module is one self-contained package
    assert!(out.starts_with("package parser\n"));
    assert!(out.ends_with("\n"));
    assert!(out.contains("func ParseFile(filePath string) (Node, error) {"));
}

#[test]
fn memoized_left_recursive_rule_end_to_end() {
    let text = spec(
        "ident: | [a-zA-Z_] [a-zA-Z0-9_]*\n",
        "if\n",
        "+\n",
        "binary <x op y>\n",
        "expr(memo): | expr '+' term\n    | term\nterm: | IDENT\nfile: | expr\n",
        "",
    );
    let out = generate(&text).unwrap();

    assert!(out.contains("const exprMemoId = 0"));
    assert!(out.contains("func (ps *Parser) expr() Node {"));
    assert!(out.contains("cacheAtPos[exprMemoId] = &NodeCache{t, ps._mark()}"));
    assert!(out.contains("func (ps *Parser) expr_() Node {"));
    assert!(out.contains("_left := ps.exprLeftMost()"));
    assert!(out.contains("_ret := ps.exprRightPart(_left)"));
    assert!(out.contains("func (ps *Parser) exprLeftMost() Node {"));
    assert!(out.contains("func (ps *Parser) exprRightPart(_left Node) Node {"));

    // the left-most half implements `| term`, the right part `'+' term`
    let left_most = out.find("func (ps *Parser) exprLeftMost() Node {").unwrap();
    let right_part = out
        .find("func (ps *Parser) exprRightPart(_left Node) Node {")
        .unwrap();
    assert!(out[left_most..right_part].contains("ps.term()"));
    assert!(out[right_part..].contains("_expectK(TokenTypeOpPlus)"));
}

#[test]
fn ast_node_end_to_end() {
    let text = spec(
        "ident: | [a-z]+\n",
        "if\n",
        "+\n",
        "binary <x op y>\n",
        "file: | x='if' o='if' y='if' {binary(x, o, y)}\n",
        "",
    );
    let out = generate(&text).unwrap();

    assert!(out.contains("type IBinaryNode interface {"));
    assert!(out.contains("X() Node"));
    assert!(out.contains("SetX(v Node)"));
    assert!(out.contains("Op() Node"));
    assert!(out.contains("SetOp(v Node)"));
    assert!(out.contains("Y() Node"));
    assert!(out.contains("SetY(v Node)"));
    assert!(out.contains(
        "func NewBinaryNode(filePath string, fileContent []rune, x Node, op Node, y Node, start, end Position) Node {"
    ));
    let fields = out.find("func (n *BinaryNode) Fields() []string {").unwrap();
    let tail = &out[fields..];
    let x = tail.find("\"x\",").unwrap();
    let op = tail.find("\"op\",").unwrap();
    let y = tail.find("\"y\",").unwrap();
    assert!(x < op && op < y);
    assert!(out.contains("func (n *BinaryNode) BuildLink() {"));
    assert!(out.contains("x.SetReplaceSelf(func(n Node) {"));
    assert!(out.contains("n.Parent().(IBinaryNode).SetOp(n)"));
}

#[test]
fn keyword_upgrade_path_end_to_end() {
    let text = spec(
        "ident: | [a-zA-Z_] [a-zA-Z0-9_]*\n",
        "return\n",
        "+\n",
        "",
        "file: | 'return' {_}\n",
        "",
    );
    let out = generate(&text).unwrap();

    // ident matches first, then the keyword map upgrades the kind
    assert!(out.contains("} else if tk.ident() {"));
    assert!(out.contains("kind = TokenTypeIdent"));
    assert!(out.contains("if kind == TokenTypeIdent {"));
    assert!(out.contains("k, ok := tk._keywords[string(val)]"));
    assert!(out.contains("tk._keywords[\"return\"] = TokenTypeKwReturn"));
    assert!(out.contains("_expectK(TokenTypeKwReturn)"));
}

#[test]
fn separated_repeat_end_to_end() {
    let text = spec(
        "ident: | [a-z]+\n",
        "if\n",
        ",\n",
        "",
        "file: | list=','.item+ {list}\nitem: | IDENT\n",
        "",
    );
    let out = generate(&text).unwrap();

    assert!(out.contains("var list Node"));
    assert!(out.contains("_1 := make([]Node, 0)"));
    assert!(out.contains("_3 = ps._expectK(TokenTypeOpComma)"));
    assert!(out.contains("if _3 == nil {"));
    assert!(out.contains("ps._reset(_p)"));
    assert!(out.contains("list = NewNodesNode(_1)"));
    assert!(out.contains("return list"));
}

#[test]
fn cooperative_backtracking_region_end_to_end() {
    let text = spec(
        "ident: | [a-z]+\n",
        "if\n",
        "==\n",
        "",
        "file: | 'if' [ cond=expression ] '==' {_}\nexpression: | IDENT\n",
        "",
    );
    let out = generate(&text).unwrap();

    assert!(out.contains("_break := true"));
    assert!(out.contains("ps._enter()"));
    assert!(out.contains("cond = ps.expression()"));
    assert!(out.contains("_break = false"));
    assert!(out.contains("ps._leave()"));
    assert!(out.contains("if _break {"));
}

#[test]
fn five_sections_fail_with_structural_error() {
    let divider = format!("{}\n", "-".repeat(120));
    let text = ["a\n", "b\n", "c\n", "d\n", "e\n"].join(&divider);
    let err = generate(&text).unwrap_err();
    match &err {
        GenerateError::Structure(msg) => {
            assert!(msg.contains("expected 6 parts, got 5"), "{msg}");
        }
        other => panic!("expected structure error, got {other:?}"),
    }
    assert_eq!(err.exit_code(), 2);
}

#[test]
fn seven_sections_fail_with_structural_error() {
    let divider = format!("{}\n", "-".repeat(120));
    let text = ["a\n"; 7].join(&divider);
    let err = generate(&text).unwrap_err();
    assert!(matches!(err, GenerateError::Structure(_)));
    assert!(err.to_string().contains("expected 6 parts, got 7"));
}

#[test]
fn grammar_rule_without_choices_fails_to_parse() {
    let text = spec("ident: | [a-z]+\n", "if\n", "+\n", "", "file:\n", "");
    let err = generate(&text).unwrap_err();
    match &err {
        GenerateError::Parse(msg) => {
            assert!(msg.contains("expect grammar item node"), "{msg}");
        }
        other => panic!("expected parse error, got {other:?}"),
    }
    assert_eq!(err.exit_code(), 2);
}

#[test]
fn fully_left_recursive_rule_returns_nil_without_looping() {
    let text = spec(
        "ident: | [a-z]+\n",
        "if\n",
        "+\n",
        "",
        "loop: | loop '+'\nfile: | 'if' {_}\n",
        "",
    );
    let out = generate(&text).unwrap();
    assert!(out.contains("func (ps *Parser) loopLeftMost() Node {\n\treturn nil\n}"));
    assert!(out.contains("_left := ps.loopLeftMost()"));
    assert!(out.contains("if _left == nil {\n\t\treturn nil\n\t}"));
}

#[test]
fn overlapping_operators_commit_to_longest_match() {
    let text = spec(
        "ident: | [a-z]+\n",
        "if\n",
        "<\n<<\n<<=\n",
        "",
        "file: | 'if' {_}\n",
        "",
    );
    let out = generate(&text).unwrap();
    let arm = out.find("case '<':").unwrap();
    let tail = &out[arm..];
    let deepest = tail.find("kind = TokenTypeOpLessLessEqual").unwrap();
    let middle = tail.find("kind = TokenTypeOpLessLess\n").unwrap();
    let shallow = tail.find("kind = TokenTypeOpLess\n").unwrap();
    assert!(deepest < middle && middle < shallow);
    assert!(out.contains("const TokenTypeOpLessLessEqual = \"<<=\""));
}

#[test]
fn hack_code_is_pasted_verbatim() {
    let text = spec(
        "ident: | [a-z]+\n",
        "if\n",
        "+\n",
        "",
        "file: | 'if' {_}\n",
        "func (ps *Parser) _enter() {}\nfunc (ps *Parser) _leave() {}\n",
    );
    let out = generate(&text).unwrap();
    assert!(out.contains("func (ps *Parser) _enter() {}\nfunc (ps *Parser) _leave() {}"));
}

#[test]
fn generation_is_deterministic() {
    init_logger();
    let text = spec(
        "ident: | [a-zA-Z_] [a-zA-Z0-9_]*\nnumber: | [0-9]+\n",
        "if\nreturn\nfor\n",
        "==\n+\n-\n<\n<=\n,\n;\n(\n)\n",
        "binary <x op y>\nunary <op x>\ncall <callee args>\n",
        "expr(memo): | expr '+' term\n    | term\nterm: | IDENT\n    | NUMBER\nfile: | stmt*\nstmt: | s=expr ';' {[s]}\n",
        "// hack\n",
    );
    let first = generate(&text).unwrap();
    let second = generate(&text).unwrap();
    assert_eq!(first, second);
    assert!(first.len() > 10_000);
}

#[test]
fn custom_package_name() {
    let text = spec("ident: | [a-z]+\n", "if\n", "+\n", "", "file: | 'if' {_}\n", "");
    let options = peggen::Options {
        package_name: "mylang".to_string(),
    };
    let out = peggen::generate_with(&text, &options).unwrap();
    assert!(out.starts_with("package mylang\n"));
}
