//! Operator trie: one node per operator-string prefix, emitted as a
//! byte-switch cascade that always commits to the longest match.

use crate::gen::Emitter;
use pegkit::to_pascal_case;
use std::collections::BTreeMap;

/// One trie node. Children are keyed by the extending byte and iterate
/// in byte order, which keeps the emitted cascade deterministic.
#[derive(Debug, Default)]
pub struct OpTrie {
    name: String,
    level: usize,
    children: BTreeMap<u8, OpTrie>,
}

impl OpTrie {
    pub fn new() -> Self {
        Self::default()
    }

    /// Inserts an operator: `name` is its spelled-out identifier, `val`
    /// the literal operator bytes.
    pub fn update(&mut self, name: &str, val: &[u8]) {
        if self.level == val.len() {
            self.name = name.to_string();
            return;
        }
        let ch = val[self.level];
        let level = self.level;
        let child = self.children.entry(ch).or_insert_with(|| OpTrie {
            name: String::new(),
            level: level + 1,
            children: BTreeMap::new(),
        });
        child.update(name, val);
    }

    fn escaped_ch(ch: u8) -> String {
        if ch == b'\\' {
            "\\\\".to_string()
        } else {
            (ch as char).to_string()
        }
    }

    /// Emits the root-level `case` arms of the `op()` switch.
    pub fn gen_code(&self, em: &mut Emitter) {
        for (&ch, child) in &self.children {
            em.put(format!("case '{}':", Self::escaped_ch(ch)));
            em.push();
            em.put("entered = true");
            em.put("tk._forward()");
            child.gen_child_code(em);
            if !child.name.is_empty() {
                em.put(format!("kind = TokenTypeOp{}", to_pascal_case(&child.name)));
            }
            em.pop();
        }
    }

    fn gen_child_code(&self, em: &mut Emitter) {
        for (&ch, child) in &self.children {
            em.put(format!("if tk._lookahead == '{}' {{", Self::escaped_ch(ch)));
            em.push();
            let mut pos_var = String::new();
            if child.name.is_empty() {
                pos_var = em.create_var("p");
                em.put(format!("{pos_var} := tk._mark()"));
            }
            em.put("tk._forward()");
            child.gen_child_code(em);
            if !child.name.is_empty() {
                em.put(format!("kind = TokenTypeOp{}", to_pascal_case(&child.name)));
                em.put("break");
            } else {
                em.put(format!("tk._reset({pos_var})"));
            }
            em.pop();
            em.put("}");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn trie_for(ops: &[(&str, &str)]) -> String {
        let mut trie = OpTrie::new();
        for (name, val) in ops {
            trie.update(name, val.as_bytes());
        }
        let mut em = Emitter::new();
        trie.gen_code(&mut em);
        em.finish()
    }

    #[test]
    fn single_operator_single_arm() {
        let code = trie_for(&[("equal_equal", "==")]);
        assert!(code.contains("case '=':"));
        assert!(code.contains("if tk._lookahead == '=' {"));
        assert!(code.contains("kind = TokenTypeOpEqualEqual"));
        // '=' alone is not an operator here, so the root arm sets no kind
        // outside the nested cascade
        assert_eq!(code.matches("kind = ").count(), 1);
    }

    #[test]
    fn longest_match_nests_deepest_first() {
        let code = trie_for(&[("less", "<"), ("less_less", "<<"), ("less_less_equal", "<<=")]);
        let less = code.find("kind = TokenTypeOpLess\n").unwrap();
        let less_less = code.find("kind = TokenTypeOpLessLess\n").unwrap();
        let less_less_equal = code.find("kind = TokenTypeOpLessLessEqual").unwrap();
        // the deepest suffix commits innermost, shortest last
        assert!(less_less_equal < less_less);
        assert!(less_less < less);
    }

    #[test]
    fn unnamed_interior_nodes_mark_and_reset() {
        // `<<=` declared without `<<`: the `<<` node has no name and must
        // backtrack when `=` does not follow
        let code = trie_for(&[("less", "<"), ("less_less_equal", "<<=")]);
        assert!(code.contains("_p := tk._mark()"));
        assert!(code.contains("tk._reset(_p)"));
    }

    #[test]
    fn children_emit_in_byte_order() {
        let code = trie_for(&[("greater", ">"), ("not", "!"), ("equal", "=")]);
        let not = code.find("case '!':").unwrap();
        let eq = code.find("case '=':").unwrap();
        let gt = code.find("case '>':").unwrap();
        assert!(not < eq && eq < gt);
    }

    #[test]
    fn backslash_is_escaped_in_char_literals() {
        let code = trie_for(&[("back_slash", "\\")]);
        assert!(code.contains("case '\\\\':"));
    }
}
