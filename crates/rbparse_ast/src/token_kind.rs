//! TokenKind enum - every terminal of the Ruby grammar.
//!
//! The names returned by `grammar_name` are the ones grammar rules use:
//! `kEND` style for keywords, `tIDENTIFIER` style for tokens, and quoted
//! characters such as `'+'` for single-character punctuation.

macro_rules! token_kinds {
    ($( $(#[$meta:meta])* $variant:ident => $name:literal, )*) => {
        /// A terminal symbol of the grammar.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
        #[repr(u16)]
        pub enum TokenKind {
            $( $(#[$meta])* $variant, )*
        }

        impl TokenKind {
            /// Every token kind, in discriminant order.
            pub const ALL: &'static [TokenKind] = &[$(TokenKind::$variant,)*];

            /// The name used for this terminal in grammar rules and messages.
            pub fn grammar_name(self) -> &'static str {
                match self {
                    $( TokenKind::$variant => $name, )*
                }
            }
        }
    };
}

token_kinds! {
    /// End of input.
    EndOfInput => "$end",
    /// The synthetic error terminal used by error recovery.
    Error => "error",

    // ========================================================================
    // Keywords
    // ========================================================================
    KClass => "kCLASS",
    KModule => "kMODULE",
    KDef => "kDEF",
    KUndef => "kUNDEF",
    KBegin => "kBEGIN",
    KRescue => "kRESCUE",
    KEnsure => "kENSURE",
    KEnd => "kEND",
    KIf => "kIF",
    KUnless => "kUNLESS",
    KThen => "kTHEN",
    KElsif => "kELSIF",
    KElse => "kELSE",
    KCase => "kCASE",
    KWhen => "kWHEN",
    KWhile => "kWHILE",
    KUntil => "kUNTIL",
    KFor => "kFOR",
    KBreak => "kBREAK",
    KNext => "kNEXT",
    KRedo => "kREDO",
    KRetry => "kRETRY",
    KIn => "kIN",
    KDo => "kDO",
    KDoCond => "kDO_COND",
    KDoBlock => "kDO_BLOCK",
    KReturn => "kRETURN",
    KYield => "kYIELD",
    KSuper => "kSUPER",
    KSelf => "kSELF",
    KNil => "kNIL",
    KTrue => "kTRUE",
    KFalse => "kFALSE",
    KAnd => "kAND",
    KOr => "kOR",
    KNot => "kNOT",
    KIfMod => "kIF_MOD",
    KUnlessMod => "kUNLESS_MOD",
    KWhileMod => "kWHILE_MOD",
    KUntilMod => "kUNTIL_MOD",
    KRescueMod => "kRESCUE_MOD",
    KAlias => "kALIAS",
    KDefined => "kDEFINED",
    KLBegin => "klBEGIN",
    KLEnd => "klEND",
    KLine => "k__LINE__",
    KFile => "k__FILE__",

    // ========================================================================
    // Names and literals
    // ========================================================================
    Identifier => "tIDENTIFIER",
    Fid => "tFID",
    GlobalVar => "tGVAR",
    InstVar => "tIVAR",
    Constant => "tCONSTANT",
    ClassVar => "tCVAR",
    Integer => "tINTEGER",
    Float => "tFLOAT",
    StringContent => "tSTRING_CONTENT",
    NthRef => "tNTH_REF",
    BackRef => "tBACK_REF",
    RegexpEnd => "tREGEXP_END",

    // ========================================================================
    // Operators
    // ========================================================================
    UPlus => "tUPLUS",
    UMinus => "tUMINUS",
    UMinusNum => "tUMINUS_NUM",
    Pow => "tPOW",
    Cmp => "tCMP",
    Eq => "tEQ",
    Eqq => "tEQQ",
    Neq => "tNEQ",
    Geq => "tGEQ",
    Leq => "tLEQ",
    AndOp => "tANDOP",
    OrOp => "tOROP",
    Match => "tMATCH",
    NMatch => "tNMATCH",
    Dot2 => "tDOT2",
    Dot3 => "tDOT3",
    Aref => "tAREF",
    Aset => "tASET",
    LShift => "tLSHFT",
    RShift => "tRSHFT",
    Colon2 => "tCOLON2",
    Colon3 => "tCOLON3",
    OpAsgn => "tOP_ASGN",
    Assoc => "tASSOC",
    LParen => "tLPAREN",
    LParenArg => "tLPAREN_ARG",
    LBrack => "tLBRACK",
    LBrace => "tLBRACE",
    LBraceArg => "tLBRACE_ARG",
    Star => "tSTAR",
    Amper => "tAMPER",

    // ========================================================================
    // String delimiters
    // ========================================================================
    SymBeg => "tSYMBEG",
    StringBeg => "tSTRING_BEG",
    XStringBeg => "tXSTRING_BEG",
    RegexpBeg => "tREGEXP_BEG",
    WordsBeg => "tWORDS_BEG",
    QWordsBeg => "tQWORDS_BEG",
    StringDBeg => "tSTRING_DBEG",
    StringDVar => "tSTRING_DVAR",
    StringEnd => "tSTRING_END",

    /// Precedence-only terminal, never produced by the lexer.
    Lowest => "tLOWEST",

    // ========================================================================
    // Single-character tokens
    // ========================================================================
    Newline => "'\\n'",
    /// Word separator inside `%w` and `%W` lists.
    Space => "' '",
    Semicolon => "';'",
    Comma => "','",
    Assign => "'='",
    Question => "'?'",
    Colon => "':'",
    Gt => "'>'",
    Lt => "'<'",
    Pipe => "'|'",
    Caret => "'^'",
    Amp => "'&'",
    Plus => "'+'",
    Minus => "'-'",
    Asterisk => "'*'",
    Slash => "'/'",
    Percent => "'%'",
    Bang => "'!'",
    Tilde => "'~'",
    LParenPlain => "'('",
    RParen => "')'",
    LBracket => "'['",
    RBracket => "']'",
    LBracePlain => "'{'",
    RBrace => "'}'",
    Dot => "'.'",
    Backtick => "'`'",
}

impl TokenKind {
    /// Look up a token kind by its grammar name.
    pub fn from_grammar_name(name: &str) -> Option<TokenKind> {
        TokenKind::ALL
            .iter()
            .copied()
            .find(|kind| kind.grammar_name() == name)
    }

    /// The terminal index used by parse tables.
    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }

    /// Token kind for a terminal index.
    #[inline]
    pub fn from_index(index: usize) -> Option<TokenKind> {
        TokenKind::ALL.get(index).copied()
    }

    /// The method name an operator token denotes, when it names one.
    pub fn method_name(self) -> Option<&'static str> {
        Some(match self {
            TokenKind::UPlus => "+@",
            TokenKind::UMinus => "-@",
            TokenKind::Pow => "**",
            TokenKind::Cmp => "<=>",
            TokenKind::Eq => "==",
            TokenKind::Eqq => "===",
            TokenKind::Neq => "!=",
            TokenKind::Geq => ">=",
            TokenKind::Leq => "<=",
            TokenKind::Match => "=~",
            TokenKind::NMatch => "!~",
            TokenKind::Aref => "[]",
            TokenKind::Aset => "[]=",
            TokenKind::LShift => "<<",
            TokenKind::RShift => ">>",
            TokenKind::Star | TokenKind::Asterisk => "*",
            TokenKind::Gt => ">",
            TokenKind::Lt => "<",
            TokenKind::Pipe => "|",
            TokenKind::Caret => "^",
            TokenKind::Amp => "&",
            TokenKind::Plus => "+",
            TokenKind::Minus => "-",
            TokenKind::Slash => "/",
            TokenKind::Percent => "%",
            TokenKind::Bang => "!",
            TokenKind::Tilde => "~",
            TokenKind::Backtick => "`",
            _ => return None,
        })
    }

    /// Whether this is a reserved word.
    pub fn is_keyword(self) -> bool {
        self >= TokenKind::KClass && self <= TokenKind::KFile
    }
}
