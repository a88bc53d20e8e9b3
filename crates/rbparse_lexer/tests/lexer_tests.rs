//! Lexer integration tests.
//!
//! Drives the lexer directly, standing in for the parser where a test needs
//! the state the parser would normally set.

use rbparse_ast::{RegexpOptions, TokenKind};
use rbparse_core::StringInterner;
use rbparse_lexer::{LexError, LexState, Lexer, Token, TokenValue};

use TokenKind as T;

/// Helper: lex the whole source with no known locals.
fn lex_all(source: &str) -> Vec<Token> {
    lex_with_locals(source, &[])
}

fn lex_with_locals(source: &str, locals: &[&str]) -> Vec<Token> {
    let interner = StringInterner::new();
    let mut lexer = Lexer::new(source, interner.intern("test.rb"), 0);
    let is_local = |name: &str| locals.contains(&name);
    let mut tokens = Vec::new();
    loop {
        let token = lexer.next_token(&is_local).expect("unexpected lex error");
        let done = token.kind == T::EndOfInput;
        tokens.push(token);
        if done {
            return tokens;
        }
    }
}

fn lex_kinds(source: &str) -> Vec<TokenKind> {
    lex_all(source).into_iter().map(|t| t.kind).collect()
}

fn lex_error(source: &str) -> LexError {
    let interner = StringInterner::new();
    let mut lexer = Lexer::new(source, interner.intern("test.rb"), 0);
    loop {
        match lexer.next_token(&|_| false) {
            Ok(token) if token.kind == T::EndOfInput => panic!("expected a lex error for {:?}", source),
            Ok(_) => {}
            Err(err) => return err,
        }
    }
}

fn str_value(token: &Token) -> &str {
    match &token.value {
        TokenValue::Str(s) => s,
        other => panic!("expected string content, got {:?}", other),
    }
}

// ============================================================================
// Keywords and identifiers
// ============================================================================

#[test]
fn test_keyword_at_expression_start() {
    assert_eq!(
        lex_kinds("if x then y end"),
        vec![T::KIf, T::Identifier, T::KThen, T::Identifier, T::KEnd, T::EndOfInput]
    );
}

#[test]
fn test_modifier_keywords() {
    assert_eq!(
        lex_kinds("foo if bar"),
        vec![T::Identifier, T::KIfMod, T::Identifier, T::EndOfInput]
    );
    assert_eq!(
        lex_kinds("x rescue nil"),
        vec![T::Identifier, T::KRescueMod, T::KNil, T::EndOfInput]
    );
    assert_eq!(
        lex_kinds("a while b"),
        vec![T::Identifier, T::KWhileMod, T::Identifier, T::EndOfInput]
    );
}

#[test]
fn test_keyword_after_dot_is_identifier() {
    assert_eq!(
        lex_kinds("x.class"),
        vec![T::Identifier, T::Dot, T::Identifier, T::EndOfInput]
    );
}

#[test]
fn test_fid_and_constant() {
    let tokens = lex_all("empty? save! Foo");
    assert_eq!(tokens[0].kind, T::Fid);
    assert_eq!(tokens[0].text(), Some("empty?"));
    assert_eq!(tokens[1].kind, T::Fid);
    assert_eq!(tokens[2].kind, T::Constant);
}

#[test]
fn test_predicate_before_equals_is_not_fid() {
    assert_eq!(
        lex_kinds("a!=b"),
        vec![T::Identifier, T::Neq, T::Identifier, T::EndOfInput]
    );
}

#[test]
fn test_setter_name_after_def() {
    let tokens = lex_all("def foo=(v)");
    assert_eq!(tokens[0].kind, T::KDef);
    assert_eq!(tokens[1].kind, T::Identifier);
    assert_eq!(tokens[1].text(), Some("foo="));
    assert_eq!(tokens[2].kind, T::LParenPlain);
}

#[test]
fn test_operator_method_names_after_def() {
    assert_eq!(lex_kinds("def []=")[1], T::Aset);
    assert_eq!(lex_kinds("def []")[1], T::Aref);
    assert_eq!(lex_kinds("def +@")[1], T::UPlus);
    assert_eq!(lex_kinds("def -")[1], T::Minus);
}

#[test]
fn test_defined_keyword() {
    assert_eq!(lex_kinds("defined? x")[0], T::KDefined);
}

#[test]
fn test_unicode_identifier() {
    let tokens = lex_all("café = 1");
    assert_eq!(tokens[0].kind, T::Identifier);
    assert_eq!(tokens[0].text(), Some("café"));
}

#[test]
fn test_known_local_indexes_instead_of_calling() {
    assert_eq!(lex_kinds("x [1]")[1], T::LBrack);
    let tokens = lex_with_locals("x [1]", &["x"]);
    assert_eq!(tokens[1].kind, T::LBracket);
}

// ============================================================================
// Variables
// ============================================================================

#[test]
fn test_global_variables() {
    let tokens = lex_all("$foo $1 $& $: $-w");
    assert_eq!(tokens[0].kind, T::GlobalVar);
    assert_eq!(tokens[0].text(), Some("$foo"));
    assert_eq!(tokens[1].value, TokenValue::NthRef(1));
    assert_eq!(tokens[2].value, TokenValue::BackRef('&'));
    assert_eq!(tokens[3].text(), Some("$:"));
    assert_eq!(tokens[4].text(), Some("$-w"));
}

#[test]
fn test_instance_and_class_variables() {
    let tokens = lex_all("@a @@b");
    assert_eq!(tokens[0].kind, T::InstVar);
    assert_eq!(tokens[0].text(), Some("@a"));
    assert_eq!(tokens[1].kind, T::ClassVar);
    assert_eq!(tokens[1].text(), Some("@@b"));
}

#[test]
fn test_invalid_instance_variable_names() {
    assert!(lex_error("@1").message.contains("`@1' is not allowed"));
    assert!(lex_error("@ ").message.contains("without identifiers"));
}

// ============================================================================
// Numbers
// ============================================================================

#[test]
fn test_integer_literals() {
    let values: Vec<TokenValue> = lex_all("42 0x1F 0b101 0o17 017 1_000 0d99 0")
        .into_iter()
        .filter(|t| t.kind == T::Integer)
        .map(|t| t.value)
        .collect();
    assert_eq!(
        values,
        vec![
            TokenValue::Integer(42),
            TokenValue::Integer(31),
            TokenValue::Integer(5),
            TokenValue::Integer(15),
            TokenValue::Integer(15),
            TokenValue::Integer(1000),
            TokenValue::Integer(99),
            TokenValue::Integer(0),
        ]
    );
}

#[test]
fn test_float_literals() {
    let tokens = lex_all("3.14 1e3 2.5E-2");
    assert_eq!(tokens[0].value, TokenValue::Float(3.14));
    assert_eq!(tokens[1].value, TokenValue::Float(1000.0));
    assert_eq!(tokens[2].value, TokenValue::Float(0.025));
}

#[test]
fn test_big_integer() {
    let tokens = lex_all("12345678901234567890");
    assert_eq!(
        tokens[0].value,
        TokenValue::BigInteger {
            digits: "12345678901234567890".to_string(),
            radix: 10
        }
    );
}

#[test]
fn test_range_is_not_float() {
    assert_eq!(
        lex_kinds("1..2"),
        vec![T::Integer, T::Dot2, T::Integer, T::EndOfInput]
    );
}

#[test]
fn test_number_errors() {
    assert!(lex_error("1__0").message.contains("trailing `_'"));
    assert!(lex_error("0x").message.contains("without digits"));
    assert!(lex_error("09").message.contains("Illegal octal digit"));
    assert!(lex_error(".5").message.contains("put 0 before dot"));
}

#[test]
fn test_unary_minus_number() {
    assert_eq!(lex_kinds("-1"), vec![T::UMinusNum, T::Integer, T::EndOfInput]);
    assert_eq!(
        lex_kinds("a - 1"),
        vec![T::Identifier, T::Minus, T::Integer, T::EndOfInput]
    );
    assert_eq!(
        lex_kinds("foo -1"),
        vec![T::Identifier, T::UMinusNum, T::Integer, T::EndOfInput]
    );
}

#[test]
fn test_character_literal() {
    assert_eq!(lex_all("?a")[0].value, TokenValue::Integer(97));
    assert_eq!(lex_all("?\\n")[0].value, TokenValue::Integer(10));
    assert_eq!(lex_kinds("x ?a")[1], T::Integer);
}

#[test]
fn test_ternary_question_mark() {
    assert_eq!(
        lex_kinds("a ? b : c"),
        vec![T::Identifier, T::Question, T::Identifier, T::Colon, T::Identifier, T::EndOfInput]
    );
}

// ============================================================================
// Operators and punctuation
// ============================================================================

#[test]
fn test_op_assign() {
    let tokens = lex_all("x += 1; y ||= 2; z <<= 3");
    let ops: Vec<&str> = tokens
        .iter()
        .filter(|t| t.kind == T::OpAsgn)
        .filter_map(|t| t.text())
        .collect();
    assert_eq!(ops, vec!["+", "||", "<<"]);
}

#[test]
fn test_comparison_operators() {
    assert_eq!(
        lex_kinds("a <=> b == c === d =~ e !~ f"),
        vec![
            T::Identifier,
            T::Cmp,
            T::Identifier,
            T::Eq,
            T::Identifier,
            T::Eqq,
            T::Identifier,
            T::Match,
            T::Identifier,
            T::NMatch,
            T::Identifier,
            T::EndOfInput
        ]
    );
}

#[test]
fn test_star_and_amper_as_argument_prefix() {
    assert_eq!(lex_kinds("foo *args")[1], T::Star);
    assert_eq!(lex_kinds("a * b")[1], T::Asterisk);
    assert_eq!(lex_kinds("foo &blk")[1], T::Amper);
    assert_eq!(lex_kinds("a & b")[1], T::Amp);
}

#[test]
fn test_colons() {
    assert_eq!(
        lex_kinds("Foo::Bar"),
        vec![T::Constant, T::Colon2, T::Constant, T::EndOfInput]
    );
    assert_eq!(lex_kinds("::Foo")[0], T::Colon3);
    assert_eq!(lex_kinds("foo ::Bar")[1], T::Colon3);
}

#[test]
fn test_paren_arg_after_command() {
    assert_eq!(lex_kinds("foo (1)")[1], T::LParenArg);
    assert_eq!(lex_kinds("foo(1)")[1], T::LParenPlain);
    assert_eq!(lex_kinds("(1)")[0], T::LParen);
}

#[test]
fn test_braces() {
    assert_eq!(lex_kinds("{}")[0], T::LBrace);
    assert_eq!(lex_kinds("foo {}")[1], T::LBracePlain);
}

#[test]
fn test_do_variants() {
    assert_eq!(lex_kinds("foo do end")[1], T::KDo);

    let interner = StringInterner::new();
    let mut lexer = Lexer::new("do", interner.intern("test.rb"), 0);
    lexer.cond_push(true);
    assert_eq!(lexer.next_token(&|_| false).unwrap().kind, T::KDoCond);

    let mut lexer = Lexer::new("do", interner.intern("test.rb"), 0);
    lexer.cmdarg_push(true);
    lexer.set_state(LexState::Arg);
    assert_eq!(lexer.next_token(&|_| false).unwrap().kind, T::KDoBlock);
}

#[test]
fn test_regexp_or_division() {
    assert_eq!(
        lex_kinds("1 / 2"),
        vec![T::Integer, T::Slash, T::Integer, T::EndOfInput]
    );
    assert_eq!(lex_kinds("foo /x/")[1], T::RegexpBeg);
}

// ============================================================================
// Newlines, comments and documents
// ============================================================================

#[test]
fn test_newline_after_expression() {
    assert_eq!(
        lex_kinds("a\nb"),
        vec![T::Identifier, T::Newline, T::Identifier, T::EndOfInput]
    );
}

#[test]
fn test_newline_skipped_after_operator() {
    assert_eq!(
        lex_kinds("1 +\n2"),
        vec![T::Integer, T::Plus, T::Integer, T::EndOfInput]
    );
}

#[test]
fn test_comments_and_line_continuation() {
    assert_eq!(
        lex_kinds("a # comment\nb \\\n.c"),
        vec![T::Identifier, T::Newline, T::Identifier, T::Dot, T::Identifier, T::EndOfInput]
    );
}

#[test]
fn test_embedded_document() {
    let tokens = lex_all("=begin\nignored\n=end\nx");
    assert_eq!(tokens[0].kind, T::Identifier);
    assert_eq!(tokens[0].span.start_line, 3);
}

#[test]
fn test_unterminated_embedded_document() {
    assert!(lex_error("=begin\nnever closed").message.contains("embedded document"));
}

#[test]
fn test_end_marker_stops_lexing() {
    let interner = StringInterner::new();
    let mut lexer = Lexer::new("x\n__END__\ngarbage (", interner.intern("test.rb"), 0);
    let kinds: Vec<TokenKind> = std::iter::from_fn(|| {
        let token = lexer.next_token(&|_| false).unwrap();
        (token.kind != T::EndOfInput).then_some(token.kind)
    })
    .collect();
    assert_eq!(kinds, vec![T::Identifier, T::Newline]);
    assert!(lexer.end_seen());
}

#[test]
fn test_token_lines() {
    let tokens = lex_all("a\n\nb");
    assert_eq!(tokens[0].span.start_line, 0);
    assert_eq!(tokens[2].span.start_line, 2);
}

// ============================================================================
// Strings
// ============================================================================

#[test]
fn test_double_quoted_string() {
    let tokens = lex_all("\"a\\tb\"");
    assert_eq!(tokens[0].kind, T::StringBeg);
    assert_eq!(str_value(&tokens[1]), "a\tb");
    assert_eq!(tokens[2].kind, T::StringEnd);
}

#[test]
fn test_single_quoted_string_keeps_escapes() {
    let tokens = lex_all(r"'a\nb\''");
    assert_eq!(str_value(&tokens[1]), "a\\nb'");
}

#[test]
fn test_escape_sequences() {
    let tokens = lex_all(r#""\101\x41\s\e\C-a\M-a""#);
    assert_eq!(
        str_value(&tokens[1]).as_bytes().iter().take(4).copied().collect::<Vec<u8>>(),
        vec![b'A', b'A', b' ', 0x1b]
    );
}

#[test]
fn test_interpolation_hands_off_to_parser() {
    let interner = StringInterner::new();
    let mut lexer = Lexer::new("\"a#{b}c\"", interner.intern("test.rb"), 0);
    let none = |_: &str| false;
    assert_eq!(lexer.next_token(&none).unwrap().kind, T::StringBeg);
    assert_eq!(str_value(&lexer.next_token(&none).unwrap()), "a");
    assert_eq!(lexer.next_token(&none).unwrap().kind, T::StringDBeg);

    let saved = lexer.take_str_term();
    lexer.set_state(LexState::Beg);
    assert_eq!(lexer.next_token(&none).unwrap().kind, T::Identifier);
    assert_eq!(lexer.next_token(&none).unwrap().kind, T::RBrace);
    lexer.set_str_term(saved);

    assert_eq!(str_value(&lexer.next_token(&none).unwrap()), "c");
    assert_eq!(lexer.next_token(&none).unwrap().kind, T::StringEnd);
    assert_eq!(lexer.state(), LexState::End);
}

#[test]
fn test_interpolated_variable() {
    let kinds = lex_kinds("\"#@x\"");
    assert_eq!(kinds[1], T::StringDVar);
}

#[test]
fn test_percent_literals_nest() {
    let tokens = lex_all("%q(a (b) c)");
    assert_eq!(str_value(&tokens[1]), "a (b) c");
    assert_eq!(tokens[2].kind, T::StringEnd);
}

#[test]
fn test_word_list() {
    let tokens = lex_all("%w[a b]");
    let kinds: Vec<TokenKind> = tokens.iter().map(|t| t.kind).collect();
    assert_eq!(
        kinds,
        vec![
            T::QWordsBeg,
            T::StringContent,
            T::Space,
            T::StringContent,
            T::Space,
            T::StringEnd,
            T::EndOfInput
        ]
    );
    assert_eq!(str_value(&tokens[3]), "b");
}

#[test]
fn test_regexp_with_options() {
    let tokens = lex_all("/ab+/ix");
    assert_eq!(tokens[0].kind, T::RegexpBeg);
    assert_eq!(str_value(&tokens[1]), "ab+");
    assert_eq!(
        tokens[2].value,
        TokenValue::RegexpOptions(RegexpOptions::IGNORECASE | RegexpOptions::EXTENDED)
    );
}

#[test]
fn test_unknown_regexp_option() {
    assert!(lex_error("/a/q").message.contains("unknown regexp options - q"));
}

#[test]
fn test_symbols() {
    assert_eq!(lex_kinds(":foo"), vec![T::SymBeg, T::Identifier, T::EndOfInput]);
    assert_eq!(
        lex_kinds(":\"a b\""),
        vec![T::SymBeg, T::StringContent, T::StringEnd, T::EndOfInput]
    );
}

#[test]
fn test_unterminated_string() {
    assert_eq!(lex_error("\"abc").message, "unterminated string meets end of file");
}

// ============================================================================
// Here-documents
// ============================================================================

#[test]
fn test_heredoc() {
    let tokens = lex_all("x = <<EOS\nhello\nEOS\ny");
    let kinds: Vec<TokenKind> = tokens.iter().map(|t| t.kind).collect();
    assert_eq!(
        kinds,
        vec![
            T::Identifier,
            T::Assign,
            T::StringBeg,
            T::StringContent,
            T::StringEnd,
            T::Newline,
            T::Identifier,
            T::EndOfInput
        ]
    );
    assert_eq!(str_value(&tokens[3]), "hello\n");
    assert_eq!(tokens[6].span.start_line, 3);
}

#[test]
fn test_two_heredocs_on_one_line() {
    let tokens = lex_all("foo(<<A, <<B)\na\nA\nb\nB\n");
    let contents: Vec<&str> = tokens
        .iter()
        .filter(|t| t.kind == T::StringContent)
        .map(str_value)
        .collect();
    assert_eq!(contents, vec!["a\n", "b\n"]);
    let kinds: Vec<TokenKind> = tokens.iter().map(|t| t.kind).collect();
    assert_eq!(&kinds[kinds.len() - 3..], &[T::RParen, T::Newline, T::EndOfInput]);
}

#[test]
fn test_indented_single_quoted_heredoc() {
    let tokens = lex_all("<<-'EOS'\n  #{raw}\n  EOS\n");
    assert_eq!(str_value(&tokens[1]), "  #{raw}\n");
    assert_eq!(tokens[2].kind, T::StringEnd);
}

#[test]
fn test_unterminated_heredoc() {
    assert_eq!(
        lex_error("<<EOS\nbody\n").message,
        "can't find string \"EOS\" anywhere before EOF"
    );
}

#[test]
fn test_left_shift_is_not_heredoc() {
    assert_eq!(
        lex_kinds("a << b"),
        vec![T::Identifier, T::LShift, T::Identifier, T::EndOfInput]
    );
}

// ============================================================================
// Warnings
// ============================================================================

#[test]
fn test_space_before_argument_parentheses_warns() {
    let interner = StringInterner::new();
    let mut lexer = Lexer::new("foo.bar (1)", interner.intern("test.rb"), 0);
    while lexer.next_token(&|_| false).unwrap().kind != T::EndOfInput {}
    let warnings = lexer.take_warnings();
    assert_eq!(warnings.len(), 1);
    assert!(!warnings[0].verbose_only);
    assert!(lexer.take_warnings().is_empty());
}
