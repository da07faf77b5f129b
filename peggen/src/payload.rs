//! The fixed runtime payload pasted into every emitted parser module.
//!
//! Each constant is a block of the target-language source. The tokenizer
//! block carries two splice points, `<op_placeholder>` and
//! `<next_placeholder>`, filled by the tokenizer generator.

pub const IMPORT_CODE: &str = r#"import (
	"bufio"
	"bytes"
	"encoding/json"
	"errors"
	"fmt"
	"golang.org/x/text/encoding/simplifiedchinese"
	"golang.org/x/text/encoding/unicode"
	"golang.org/x/text/transform"
	"os"
	"reflect"
	"regexp"
	"sort"
	"strconv"
	"strings"
	uni "unicode"
	"unicode/utf8"
)"#;

pub const POSITION_STRUCT: &str = r#"type Position struct {
	Offset  int
	LineIdx int
	CharIdx int
}"#;

pub const TOKEN_STRUCT: &str = r#"func NewToken(kind string, start, end Position, val []rune) *Token {
	return &Token{
		Kind:  kind,
		Start: start,
		End:   end,
		Value: val,
	}
}

type Token struct {
	Kind  string
	Start Position
	End   Position
	Value []rune
}

func (t *Token) Fork() *Token {
	return &Token{
		Kind:  t.Kind,
		Start: t.Start,
		End:   t.End,
		Value: t.Value,
	}
}"#;

pub const NODE_INTERFACE: &str = r#"type Node interface {
	Kind() string
	Range() (Position, Position)
	SetRange(Position, Position)
	RangeStart() Position
	RangeEnd() Position
	BuildLink()
	Parent() Node
	SetParent(Node)
	SelfField() string
	SetSelfField(string)
	Fields() []string
	ReplaceSelf(Node)
	SetReplaceSelf(func(Node))
	Child(field string) Node
	SetChild(nodes []Node)
	Fork() Node
	Visit(func(Node) (visitChildren, exit bool), func(Node) (exit bool)) (exit bool)
	FilePath() string
	FileContent() []rune
	Code() []rune
	Dump(hook func(Node, map[string]string) string) map[string]string
	IsDummy() bool
	UnpackNodes() []Node
}"#;

pub const ERROR_CONTEXT_FUNC: &str = r#"func errorContext(filePath string, fileContent []rune, offset, lineIdx, charIdx int) string {
	var lineStartOffset int
	for i := offset; i >= 0; i-- {
		if i < len(fileContent) && fileContent[i] == '\n' {
			lineStartOffset = i + 1
			break
		}
	}
	lineText := regexp.MustCompile("[^\\t]").ReplaceAllString(string(fileContent[lineStartOffset:offset]), " ")

	lines := strings.Split(string(fileContent), "\n")
	contextLines := 3
	startLine := lineIdx - contextLines
	if startLine < 0 {
		startLine = 0
	}
	endLine := lineIdx + contextLines
	if endLine >= len(lines) {
		endLine = len(lines) - 1
	}
	var sb strings.Builder
	sb.WriteString(fmt.Sprintf("=== error context (%s:%d:%d) ===\n", filePath, lineIdx+1, charIdx+1))
	for i := startLine; i <= endLine; i++ {
		prefix := "   "
		var t string
		if i == lineIdx {
			prefix = ">>>"
			t = fmt.Sprintf("          %s^\n", lineText)
		}
		sb.WriteString(fmt.Sprintf("%s %4d: %s\n", prefix, i+1, lines[i]))
		if t != "" {
			sb.WriteString(t)
		}
	}
	sb.WriteString("=== end of error context ===")
	return sb.String()
}"#;

pub const TO_SNAKE_CASE_FUNC: &str = r#"func toSnakeCase(camelCaseString string) string {
	var sb strings.Builder
	for i, char := range camelCaseString {
		if uni.IsUpper(char) && i != 0 {
			sb.WriteRune('_')
		}
		sb.WriteRune(uni.ToLower(char))
	}
	return sb.String()
}"#;

pub const TO_CAMEL_CASE_FUNC: &str = r#"func toCamelCase(s string) string {
	var sb strings.Builder
	shouldUpper := true
	for _, r := range s {
		if r == '_' {
			shouldUpper = true
		} else {
			if shouldUpper && uni.IsLetter(r) {
				sb.WriteRune(uni.ToUpper(r))
				shouldUpper = false
			} else {
				sb.WriteRune(uni.ToLower(r))
			}
		}
	}
	return sb.String()
}"#;

pub const DECODE_BYTES_FUNC: &str = r#"func DecodeBytes(bs []byte) ([]rune, [][3]int) {
	var r *bufio.Reader

	file := bytes.NewBuffer(bs)

	skipBytes := 0
	// BOM sniffing decides the decoder
	if len(bs) > 2 && bs[0] == 0xef && bs[1] == 0xbb && bs[2] == 0xbf {
		r = bufio.NewReader(file)
		skipBytes = 3
	} else if len(bs) > 1 && bs[0] == 0xff && bs[1] == 0xfe {
		r = bufio.NewReader(transform.NewReader(file, unicode.UTF16(unicode.LittleEndian, unicode.UseBOM).NewDecoder()))
		skipBytes = 2
	} else if len(bs) > 1 && bs[0] == 0xfe && bs[1] == 0xff {
		r = bufio.NewReader(transform.NewReader(file, unicode.UTF16(unicode.BigEndian, unicode.UseBOM).NewDecoder()))
		skipBytes = 2
	} else if utf8.Valid(bs) {
		r = bufio.NewReader(file)
	} else {
		r = bufio.NewReader(transform.NewReader(file, simplifiedchinese.GBK.NewDecoder()))
	}

	// entries are (rune-offset, byte-offset, size)
	offsets := make([][3]int, 0)
	offsets = append(offsets, [3]int{0, 0, skipBytes})
	byteOffset := skipBytes
	result := make([]rune, 0)
	for {
		c, s, err := r.ReadRune()
		if err != nil {
			break
		}
		if c == 0xfeff {
			continue
		}
		if s > 1 {
			offsets = append(offsets, [3]int{len(result), byteOffset, s})
		}
		byteOffset += s
		result = append(result, c)
	}

	return result, offsets
}"#;

pub const TYPE_NAME_OF_FUNC: &str = r#"func TypeNameOf(node Node) string {
	structName := reflect.ValueOf(node).Elem().Type().Name()
	name := structName[:len(structName)-4]
	return toSnakeCase(name)
}"#;

pub const EQUAL_RUNE_FUNC: &str = r#"func equalRune(a, b rune) bool {
	return a == b
}"#;

pub const IN_RANGE_FUNC: &str = r#"func inRange(v, s, e rune) bool {
	return v >= s && v <= e
}"#;

pub const NODES_SET_PARENT_FUNC: &str = r#"func nodesSetParent(targets []Node, parent Node, field string) {
	for i, target := range targets {
		target.SetParent(parent)
		target.SetSelfField(strconv.Itoa(i))
		if field != "" {
			target.SetSelfField(field)
		}
	}
}"#;

pub const NODES_VISIT_FUNC: &str = r#"func nodesVisit(nodes []Node, before func(Node) (visitChild, exit bool), after func(Node) (exit bool)) (exit bool) {
	for _, node := range nodes {
		if node.Visit(before, after) {
			return true
		}
	}
	return false
}"#;

pub const CREATION_HOOK_VAR: &str = r#"var creationHook = func(Node) {}

func SetCreationHook(h func(Node)) {
	creationHook = h
}"#;

pub const DUMMY_NODE_VAR: &str = r#"var DummyNode Node = NewBaseNode("", nil, NodeTypeDummy, Position{}, Position{})

var dummyNode = DummyNode"#;

pub const BASE_NODE_STRUCT: &str = r#"func NewBaseNode(filePath string, fileContent []rune, kind string, start, end Position) *BaseNode {
	return &BaseNode{filePath: filePath, fileContent: fileContent, kind: kind, start: start, end: end}
}

type BaseNode struct {
	filePath    string
	fileContent []rune
	kind        string
	start       Position
	end         Position
	parent      Node
	selfField   string
	replaceFun  func(Node)
	any_        any
}

func (n *BaseNode) FilePath() string {
	return n.filePath
}

func (n *BaseNode) FileContent() []rune {
	return n.fileContent
}

func (n *BaseNode) Kind() string {
	return n.kind
}

func (n *BaseNode) Range() (Position, Position) {
	return n.start, n.end
}

func (n *BaseNode) SetRange(start, end Position) {
	n.start = start
	n.end = end
}

func (n *BaseNode) RangeStart() Position {
	return n.start
}

func (n *BaseNode) RangeEnd() Position {
	return n.end
}

func (n *BaseNode) BuildLink() {
}

func (n *BaseNode) Parent() Node {
	return n.parent
}

func (n *BaseNode) SetParent(v Node) {
	n.parent = v
}

func (n *BaseNode) SelfField() string {
	return n.selfField
}

func (n *BaseNode) SetSelfField(v string) {
	n.selfField = v
}

func (n *BaseNode) ReplaceSelf(node Node) {
	node.SetReplaceSelf(n.replaceFun)
	node.SetParent(n.Parent())
	node.SetSelfField(n.SelfField())
	n.replaceFun(node)
}

func (n *BaseNode) SetReplaceSelf(fun func(Node)) {
	n.replaceFun = fun
}

func (n *BaseNode) Fields() []string {
	return nil
}

func (n *BaseNode) Child(_ string) Node {
	return DummyNode
}

func (n *BaseNode) SetChild(_ []Node) {
}

func (n *BaseNode) fork() *BaseNode {
	return &BaseNode{
		filePath:    n.filePath,
		fileContent: n.fileContent,
		kind:        n.kind,
		start:       n.start,
		end:         n.end,
		parent:      n.parent,
		selfField:   n.selfField,
		replaceFun:  n.replaceFun,
	}
}

func (n *BaseNode) Fork() Node {
	return n.fork()
}

func (n *BaseNode) Visit(func(Node) (bool, bool), func(Node) bool) bool {
	return false
}

func (n *BaseNode) Code() []rune {
	if n.fileContent == nil {
		return nil
	}
	code := n.fileContent
	start := 0
	end := len(code)
	if n.end.Offset <= len(code) && n.end.Offset >= 0 {
		end = n.end.Offset
	}
	if n.start.Offset >= 0 && n.start.Offset <= end {
		start = n.start.Offset
	}
	return code[start:end]
}

func (n *BaseNode) Dump(func(Node, map[string]string) string) map[string]string {
	return map[string]string{
		"kind": "?",
	}
}

func (n *BaseNode) IsDummy() bool {
	return n.kind == NodeTypeDummy
}

func (n *BaseNode) UnpackNodes() []Node {
	return nil
}

func (n *BaseNode) Any() any {
	return n.any_
}

func (n *BaseNode) SetAny(any_ any) {
	n.any_ = any_
}"#;

pub const NODES_NODE_STRUCT: &str = r#"type INodesNode interface {
	Node
	Nodes() []Node
	SetNodes(v []Node)
}

func NewNodesNode(nodes []Node) Node {
	if len(nodes) == 0 {
		return DummyNode
	}
	filePath := nodes[0].FilePath()
	fileContent := nodes[0].FileContent()
	start := nodes[0].RangeStart()
	end := nodes[len(nodes)-1].RangeEnd()
	ret := &NodesNode{
		BaseNode: NewBaseNode(filePath, fileContent, NodeTypeNodes, start, end),
		nodes:    nodes,
	}
	creationHook(ret)
	return ret
}

type NodesNode struct {
	*BaseNode
	nodes []Node
}

func (n *NodesNode) Nodes() []Node {
	return n.nodes
}

func (n *NodesNode) SetNodes(v []Node) {
	n.nodes = v
}

func (n *NodesNode) Fields() []string {
	ret := make([]string, 0)
	for i := 0; i < len(n.nodes); i++ {
		ret = append(ret, strconv.Itoa(i))
	}
	return ret
}

func (n *NodesNode) BuildLink() {
	nodesSetParent(n.nodes, n, "")
	for _, target := range n.nodes {
		target.BuildLink()
		target.SetReplaceSelf(func(n Node) {
			i, _ := strconv.Atoi(n.SelfField())
			n.Parent().(INodesNode).Nodes()[i] = n
		})
	}
}

func (n *NodesNode) Child(field string) Node {
	index, err := strconv.Atoi(field)
	if err != nil {
		return DummyNode
	}
	if index >= 0 && index < len(n.nodes) {
		return n.nodes[index]
	}
	return DummyNode
}

func (n *NodesNode) SetChild(nodes []Node) {
	n.nodes = nodes
}

func (n *NodesNode) Fork() Node {
	nodes := make([]Node, 0)
	for _, n := range n.nodes {
		nodes = append(nodes, n.Fork())
	}
	_ret := &NodesNode{
		BaseNode: n.BaseNode.fork(),
		nodes:    nodes,
	}
	nodesSetParent(_ret.nodes, _ret, "")
	return _ret
}

func (n *NodesNode) Visit(beforeChildren func(Node) (visitChildren, exit bool), afterChildren func(Node) (exit bool)) (exit bool) {
	vc, e := beforeChildren(n)
	if e {
		return true
	}
	if !vc {
		return false
	}
	if nodesVisit(n.nodes, beforeChildren, afterChildren) {
		return true
	}
	if afterChildren(n) {
		return true
	}
	return false
}

func (n *NodesNode) dumpNodes(hook func(Node, map[string]string) string) string {
	items := make([]string, 0)
	for _, t := range n.nodes {
		items = append(items, DumpNode(t, hook))
	}
	return fmt.Sprintf("[%s]", strings.Join(items, ", "))
}

func (n *NodesNode) Dump(hook func(Node, map[string]string) string) map[string]string {
	return map[string]string{
		"kind":  "\"nodes\"",
		"nodes": n.dumpNodes(hook),
	}
}

func (n *NodesNode) UnpackNodes() []Node {
	return n.Nodes()
}"#;

pub const TOKEN_NODE_STRUCT: &str = r#"func NewTokenNode(filePath string, fileContent []rune, token *Token) Node {
	return &TokenNode{
		BaseNode: NewBaseNode(filePath, fileContent, NodeTypeToken, token.Start, token.End),
		token:    token,
	}
}

type TokenNode struct {
	*BaseNode
	token *Token
}

func (n *TokenNode) Token() *Token {
	return n.token
}

func (n *TokenNode) Visit(beforeChildren func(Node) (visitChildren, exit bool), afterChildren func(Node) (exit bool)) (exit bool) {
	vc, e := beforeChildren(n)
	if e {
		return true
	}
	if !vc {
		return false
	}
	if afterChildren(n) {
		return true
	}
	return false
}

func (n *TokenNode) Fork() Node {
	return &TokenNode{
		BaseNode: n.BaseNode.fork(),
		token:    n.token,
	}
}

func (n *TokenNode) Dump(func(Node, map[string]string) string) map[string]string {
	val := string(n.Code())
	val = strings.ReplaceAll(val, "\\", "\\\\")
	val = strings.ReplaceAll(val, "\"", "\\\"")
	val = strings.ReplaceAll(val, "\n", "\\n")
	val = strings.ReplaceAll(val, "\r", "\\r")
	val = strings.ReplaceAll(val, "\t", "\\t")
	val = fmt.Sprintf("\"%s\"", val)
	return map[string]string{
		"kind": "\"token\"",
		"code": val,
	}
}"#;

pub const NODE_CACHE_STRUCT: &str = r#"type NodeCache struct {
	val Node
	pos int
}"#;

pub const PARSER_STRUCT: &str = r#"type Parser struct {
	_filePath    string
	_fileContent []rune

	_tokens []*Token
	_max    int
	_pos    int
	_x      int

	_bracketDepth  int
	_bracketDepths []int

	_nodeCache []map[int]*NodeCache

	_any any
}

func NewParser(filePath string, fileContent []rune, tokens []*Token) *Parser {
	ps := Parser{_filePath: filePath, _fileContent: fileContent, _tokens: tokens}
	ps._max = len(ps._tokens)
	ps._pos = 0
	ps._x = 0

	ps._bracketDepths = make([]int, ps._max+1)
	ps._nodeCache = make([]map[int]*NodeCache, ps._max)

	return &ps
}

func (ps *Parser) _mark() int {
	ps._bracketDepths[ps._pos] = ps._bracketDepth
	return ps._pos
}

func (ps *Parser) _reset(pos int) {
	ps._pos = pos
	ps._bracketDepth = ps._bracketDepths[ps._pos]
}

func (ps *Parser) _stepForward(tok *Token) {
	if len(tok.Value) == 1 {
		val := tok.Value[0]
		if val == '(' || val == '[' || val == '{' {
			ps._bracketDepth++
		} else if val == ')' || val == ']' || val == '}' {
			ps._bracketDepth--
		}
	}
	ps._pos++
	if ps._pos >= ps._max {
		ps._pos = ps._max - 1
	}
	if ps._pos > ps._x {
		ps._x = ps._pos
	}
}

func (ps *Parser) _expectK(kind string) Node {
	tok := ps._tokens[ps._pos]
	if tok.Kind == kind {
		ps._stepForward(tok)
		return NewTokenNode(ps._filePath, ps._fileContent, tok)
	}
	return nil
}

func (ps *Parser) _expectV(val string) Node {
	tok := ps._tokens[ps._pos]
	if len(tok.Value) == len(val) && string(tok.Value) == val {
		ps._stepForward(tok)
		return NewTokenNode(ps._filePath, ps._fileContent, tok)
	}
	return nil
}

func (ps *Parser) _anyToken() Node {
	tok := ps._tokens[ps._pos]
	ps._stepForward(tok)
	return NewTokenNode(ps._filePath, ps._fileContent, tok)
}

func (ps *Parser) _pseudoToken(v ...any) Node {
	var start, end *Position
	for _, t := range v {
		switch vv := t.(type) {
		case *Token:
			if vv == nil {
				continue
			}
			if start == nil {
				start = &vv.Start
			}
			end = &vv.End
		case []*Token:
			if vv == nil {
				continue
			}
			if len(vv) > 0 {
				if start == nil {
					start = &vv[0].Start
				}
				end = &vv[len(vv)-1].End
			}
		case Node:
			if vv == nil {
				continue
			}
			if start == nil {
				p := vv.RangeStart()
				start = &p
			}
			p := vv.RangeEnd()
			end = &p
		case []Node:
			if vv == nil {
				continue
			}
			if len(vv) > 0 {
				if start == nil {
					p := vv[0].RangeStart()
					start = &p
				}
				p := vv[len(vv)-1].RangeEnd()
				end = &p
			}
		default:
			return nil
		}
	}
	if start == nil || end == nil {
		return nil
	}
	val := ps._fileContent[start.Offset:end.Offset]
	return NewTokenNode(ps._filePath, ps._fileContent, NewToken(TokenTypePseudo, *start, *end, val))
}

func (ps *Parser) _expectPseudoNewline() Node {
	if ps._pos < 1 || ps._pos >= len(ps._tokens) {
		return nil
	}
	current := ps._tokens[ps._pos-1]
	lookahead := ps._tokens[ps._pos]
	if current.End.LineIdx == lookahead.Start.LineIdx {
		return nil
	}
	return NewTokenNode(ps._filePath, ps._fileContent, lookahead)
}

func (ps *Parser) _visibleTokenBefore(pos int) *Token {
	for i := pos - 1; i >= 0; i-- {
		kind := ps._tokens[i].Kind
		if kind != TokenTypeWhitespace && kind != TokenTypeNewline {
			return ps._tokens[i]
		}
	}
	return nil
}

func (ps *Parser) _mergeNodes(items ...any) Node {
	ret := make([]Node, 0)
	for _, item := range items {
		if item == nil {
			continue
		}
		if n, ok := item.(Node); ok {
			if n != nil && !n.IsDummy() {
				ret = append(ret, n)
			}
		} else if s, ok := item.([]Node); ok {
			if s != nil {
				for _, ss := range s {
					if ss != nil && !ss.IsDummy() {
						ret = append(ret, ss)
					}
				}
			}
		} else {
			panic("misused merge_nodes api")
		}
	}
	return NewNodesNode(ret)
}

func (ps *Parser) Parse() (ret Node, err error) {
	ret = ps.file()
	if ps._expectK(TokenTypeEndOfFile) != nil {
		return ret, nil
	}
	tok := ps._tokens[ps._x]
	return nil, fmt.Errorf("fail to parse: %s\n%s", ps._filePath, errorContext(ps._filePath, ps._fileContent, tok.Start.Offset, tok.Start.LineIdx, tok.Start.CharIdx))
}"#;

pub const TOKENIZER_STRUCT: &str = r#"func NewTokenizer(filePath string, fileContent []rune) *Tokenizer {
	tk := &Tokenizer{
		_filePath:  filePath,
		_buf:       fileContent,
		_bufSize:   len(fileContent),
		_pos:       Position{},
		_prevPos:   Position{},
		_lookahead: 0,
	}
	tk._lookahead = tk._safeRead()
	tk.initKeywords()
	return tk
}

type Tokenizer struct {
	_filePath  string
	_buf       []rune
	_bufSize   int
	_pos       Position
	_prevPos   Position
	_lookahead rune
	_keywords  map[string]string
}

func (tk *Tokenizer) Parse() (tokens []*Token, err error) {
	tokens = make([]*Token, 0)
	for {
		var tok *Token
		tok, err = tk.next()
		if err != nil {
			return nil, err
		}
		tokens = append(tokens, tok)
		if tok.Kind == TokenTypeEndOfFile {
			break
		}
	}
	return tokens, nil
}

func (tk *Tokenizer) _lineEnd(ch rune) bool {
	return ch == '\n' || (ch == '\r' && tk._pos.Offset < len(tk._buf) && tk._buf[tk._pos.Offset] != '\n')
}

func (tk *Tokenizer) _errorMsg(msg string) string {
	return fmt.Sprintf("fail to tokenize %s\n%s", msg, errorContext(tk._filePath, tk._buf, tk._prevPos.Offset, tk._prevPos.LineIdx, tk._prevPos.CharIdx))
}

func (tk *Tokenizer) _stepForward(ch rune) {
	p := &tk._pos
	p.Offset++
	p.CharIdx++
	if tk._lineEnd(ch) {
		p.LineIdx++
		p.CharIdx = 0
	}
}

func (tk *Tokenizer) _forward() {
	tk._stepForward(tk._safeRead())
	tk._lookahead = tk._safeRead()
}

func (tk *Tokenizer) _mark() Position {
	return tk._pos
}

func (tk *Tokenizer) _reset(p Position) {
	tk._pos = p
	tk._lookahead = tk._safeRead()
}

func (tk *Tokenizer) _safeRead() rune {
	if tk._pos.Offset >= tk._bufSize {
		return '\x00'
	} else {
		return tk._buf[tk._pos.Offset]
	}
}

func (tk *Tokenizer) _expect(r rune) bool {
	if equalRune(r, tk._lookahead) {
		tk._forward()
		return true
	}
	return false
}

func (tk *Tokenizer) _expectS(s string) bool {
	pos := tk._pos
	for i := 0; i < len(s); i++ {
		if equalRune(rune(s[i]), tk._lookahead) {
			tk._forward()
		} else {
			tk._reset(pos)
			return false
		}
	}
	return true
}

func (tk *Tokenizer) _expectU(s []rune) bool {
	pos := tk._pos
	for i := 0; i < len(s); i++ {
		if equalRune(s[i], tk._lookahead) {
			tk._forward()
		} else {
			tk._reset(pos)
			return false
		}
	}
	return true
}

func (tk *Tokenizer) _expectR(s, e rune) bool {
	if inRange(tk._lookahead, s, e) {
		tk._forward()
		return true
	}
	return false
}

func (tk *Tokenizer) _anyButEof() bool {
	if tk._lookahead != 0 {
		tk._forward()
		return true
	} else {
		return false
	}
}

func (tk *Tokenizer) _createToken(kind string) *Token {
	val := tk._buf[tk._prevPos.Offset:tk._pos.Offset]
	token := NewToken(kind, tk._prevPos, tk._pos, val)
	tk._prevPos = tk._pos
	return token
}

// newline:
//
//	| '\r\n'
//	| '\n'
//	| '\r'
func (tk *Tokenizer) newline() bool {
	// '\r\n'
	if tk._expectS("\r\n") {
		return true
	}
	// '\n'
	if tk._expectS("\n") {
		return true
	}
	// '\r'
	if tk._expectS("\r") {
		return true
	}
	return false
}

// _any_but_eol:
//
//	| !newline _any_but_eof
func (tk *Tokenizer) _anyButEol() bool {
	// !newline _any_but_eof
	_p := tk._mark()
	_ok := false
	if tk.newline() {
		_ok = true
	}
	tk._reset(_p)
	if !_ok {
		if tk._anyButEof() {
			return true
		}
	}
	return false
}

// _whitespace_ch:
//
//	| [ \t\f\u1680\u180E\u2000-\u200A\u202F\u205F\u3000\uFEFF\u00A0]
func (tk *Tokenizer) _whitespaceCh() bool {
	// [ \t\f\u1680\u180E\u2000-\u200A\u202F\u205F\u3000\uFEFF\u00A0]
	if tk._expect(0x20) || tk._expect(0x9) || tk._expect(0xC) || tk._expect(0x1680) || tk._expect(0x180E) || tk._expectR(0x2000, 0x200A) || tk._expect(0x202F) || tk._expect(0x205F) || tk._expect(0x3000) || tk._expect(0xFEFF) || tk._expect(0xA0) {
		return true
	}
	return false
}

// whitespace:
//
//	| _whitespace_ch+
func (tk *Tokenizer) whitespace() bool {
	// _whitespace_ch+
	if tk._whitespaceCh() {
		for {
			_ok := false
			if tk._whitespaceCh() {
				_ok = true
			}
			if !_ok {
				break
			}
		}
		return true
	}
	return false
}

func (tk *Tokenizer) op() string {
	entered := false
	kind := TokenTypeDummy
	switch tk._lookahead {<op_placeholder>
	default:
		break
	}
	if entered && kind == TokenTypeDummy {
		panic(tk._errorMsg("op"))
	} else {
		return kind
	}
}

func (tk *Tokenizer) next() (*Token, error) {
	kind := TokenTypeDummy
	if tk._lookahead == '\x00' {
		if tk._pos.Offset > tk._bufSize {
			panic(tk._errorMsg("eof"))
		}
		tk._stepForward('\x00')
		kind = TokenTypeEndOfFile
	} else if tk.whitespace() {
		kind = TokenTypeWhitespace
	} else if tk.newline() {
		kind = TokenTypeNewline<next_placeholder>
	} else {
		kind = tk.op()
		if kind == TokenTypeDummy {
			return nil, errors.New(tk._errorMsg(string(tk._buf[tk._prevPos.Offset])))
		}
	}

	var val []rune
	if kind == TokenTypeEndOfFile {
		val = []rune("END_OF_FILE")
	} else {
		val = tk._buf[tk._prevPos.Offset:tk._pos.Offset]
	}
	if kind == TokenTypeIdent {
		k, ok := tk._keywords[string(val)]
		if ok {
			kind = k
		}
	}
	ret := NewToken(kind, tk._prevPos, tk._pos, val)
	tk._prevPos = tk._pos
	return ret, nil
}"#;

pub const DUMP_NODE_FUNC: &str = r#"func dumpNode(n Node, hook func(Node, map[string]string) string) string {
	return CustomDumpNode(n, hook)
}

func DumpNode(n Node, hook func(Node, map[string]string) string) string {
	return CustomDumpNode(n, hook)
}

func DumpNodeIndent(node Node) string {
	result := SimpleDumpNode(node)
	var v any
	err := json.Unmarshal([]byte(result), &v)
	if err != nil {
		panic(err)
	}
	b, _ := json.MarshalIndent(v, "", "  ")
	return string(b)
}

func CustomDumpNode(node Node, hook func(Node, map[string]string) string) string {
	if node.IsDummy() {
		return "null"
	}
	itemMap := node.Dump(hook)
	ret := hook(node, itemMap)
	if ret != "" {
		return ret
	}
	items := make([]string, 0)
	for k, v := range itemMap {
		if k == "kind" {
			continue
		}
		items = append(items, fmt.Sprintf("\"%s\": %s", k, v))
	}
	sort.Strings(items)
	items = append([]string{fmt.Sprintf("\"kind\": %s", itemMap["kind"])}, items...)
	return fmt.Sprintf("{%s}", strings.Join(items, ", "))
}

func SimpleDumpNode(node Node) string {
	return CustomDumpNode(node, func(n Node, m map[string]string) string {
		return ""
	})
}"#;

pub const QUERY_NODE_FUNC: &str = r#"func QueryNode(node Node, path string) (any, error) {
	if path == "" {
		return node, nil
	}

	items := strings.Split(path, "/")
	var base any
	base = node
	for _, item := range items {
		var name, nodeType string
		if strings.Contains(item, ":") {
			subs := strings.Split(item, ":")
			name = toCamelCase(subs[0])
			nodeType = subs[1]
		} else {
			name = toCamelCase(item)
		}

		switch base.(type) {
		case Node:
			node = base.(Node)
			if name == "." {
				base = node
			} else if name == ".." {
				base = node.Parent()
				if base == nil {
					return nil, errors.New("query error: node has no parent")
				}
			} else {
				t := reflect.TypeOf(node)
				m, ok := t.MethodByName(name)
				if !ok {
					methods := make([]string, 0)
					for i := 0; i < t.NumMethod(); i++ {
						tmp := t.Method(i).Name
						methods = append(methods, tmp)
					}
					return nil, errors.New(fmt.Sprintf("query error: %v has no method '%s', available: %s", t, name, strings.Join(methods, ", ")))
				}
				result := m.Func.Call([]reflect.Value{
					reflect.ValueOf(node),
				})
				base = result[0].Interface()
			}
		case []Node:
			nodes := base.([]Node)
			index, err := strconv.Atoi(name)
			if err != nil {
				return nil, errors.New(fmt.Sprintf("query error: index should be an integer: '%s'", name))
			}
			if index < 0 || index >= len(nodes) {
				return nil, errors.New("index error")
			}
			base = nodes[index]
		default:
			return nil, errors.New(fmt.Sprintf("query error: neither Node nor []Node: '%s'", name))
		}

		if nodeType != "" {
			if cast, isNode := base.(Node); isNode {
				t := TypeNameOf(cast)
				if strings.ToLower(t) != nodeType {
					return nil, errors.New(fmt.Sprintf("type assertion error, expect: %s, actual: %s", nodeType, t))
				}
			} else {
				return nil, errors.New(fmt.Sprintf("type assertion error, not node"))
			}
		}
	}
	return base, nil
}"#;

pub const PARSE_FUNC: &str = r#"func ParseFile(filePath string) (Node, error) {
	b, err := os.ReadFile(filePath)
	if err != nil {
		return nil, err
	}
	r, _ := DecodeBytes(b)
	return parseRunes(filePath, r)
}

func ParseBytes(filePath string, b []byte) (Node, error) {
	r, _ := DecodeBytes(b)
	return parseRunes(filePath, r)
}

func parseRunes(filePath string, r []rune) (Node, error) {
	tokenizer := NewTokenizer(filePath, r)
	tokens, err := tokenizer.Parse()
	if err != nil {
		return nil, err
	}
	tokens = tokenizer.Clean(tokens)
	parser := NewParser(filePath, r, tokens)
	ret, err := parser.Parse()
	if err != nil {
		return nil, err
	}
	if ret != nil {
		ret.BuildLink()
	}
	return ret, nil
}"#;
