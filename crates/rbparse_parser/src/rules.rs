//! The Ruby grammar and its compiled tables.
//!
//! Rules are written in the notation [`GrammarBuilder::rules`] reads, in
//! the order of the 1.8 grammar. `=> Name` names the semantic action run by
//! [`crate::actions`]; `@Name` is an action that runs midway through a rule,
//! usually to adjust lexer state before the next token is read. A rule
//! without an action passes its first value through.

use crate::lalr::{GrammarBuilder, GrammarError, ParseTables};
use rbparse_ast::TokenKind;
use std::sync::OnceLock;

macro_rules! actions {
    ($($name:ident,)*) => {
        /// Semantic action of a production.
        #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
        pub enum Act {
            /// `$$ = $1`, or nothing for an empty rule.
            Default,
            $($name,)*
        }

        impl Act {
            pub fn from_name(name: &str) -> Option<Act> {
                match name {
                    $(stringify!($name) => Some(Act::$name),)*
                    _ => None,
                }
            }
        }
    };
}

actions! {
    ProgramEnter, Program, BodyStmt, CompStmt, StmtsNone, StmtsOne, StmtsAppend, StmtsRecover,
    Fname, Alias, VAlias, VAliasNthRef, Undef, IfMod, UnlessMod, WhileMod, UntilMod,
    RescueMod, BeginEnter, BeginBlock, EndBlock, Assign, MultiAssignValue, OpAssign,
    OpElementAssign, OpAttrAssign, BackrefAssign, AssignSValue, MultiAssign, And,
    Or, Not, ExprValue, ReturnArgs, BreakArgs, NextArgs, CallArgs, BlockEnter,
    BraceBlock, FCallArgs, FCallArgsBlock, CallArgsBlock, SuperArgs, YieldArgs,
    Second, MlhsWrap, MlhsHead, MlhsHeadItem, MlhsHeadStar, MlhsHeadStarAnon,
    MlhsStar, MlhsStarAnon, ListNew, MlhsAppend, Assignable, AttrIndex, AttrSet,
    ConstPath, ConstTop, BackrefAssignError, ClassNameError, CpathTop, CpathName,
    CpathScoped, FnameOp, UndefFirst, UndefAppend, AssignRescue, ConstReassign,
    Dot2, Dot3, BinOp, NegPow, UPlus, UMinus, Neq, MatchOp, NMatch, UnaryOp,
    Defined, Ternary, ArgValue, ArefCommand, ArefSplat, ArefAssocs, ArefStar,
    ParenBlockCall, ParenArgsBlockCall, CallArgsCommand, ArgsBlockPass,
    ArgsSplatBlockPass, AssocsBlockPass, AssocsSplatBlockPass, ArgsAssocsBlockPass,
    ArgsAssocsSplatBlockPass, SplatBlockPass, BlockArgOnly, Args2BlockPass,
    Arg2Block, Arg2SplatBlockPass, Args2SplatBlockPass, Arg2AssocsBlockPass,
    Args2AssocsBlockPass, Arg2AssocsSplatBlockPass, Args2AssocsSplatBlockPass,
    CmdargPush, CommandArgs, EndArg, OpenArgsEmpty, OpenArgsParen, BlockArg,
    ArgsAppend, ArgsSplat, Splat, FidCall, BeginBody, GroupedExpr, Colon2, Colon3,
    Aref, ArrayLiteral, HashLiteral, ReturnBare, YieldParen, YieldBare,
    DefinedParen, FCallBlock, MethodCallBlock, If, Unless, CondPush, CondPop, While,
    Until, Case, CaseNoSubject, CaseElseOnly, For, ClassEnter, Class, SClassSaveDef,
    SClassEnter, SClass, ModuleEnter, Module, DefEnter, Def, DefsEnter, Defs,
    BreakBare, NextBare, Redo, Retry, PrimaryValue, Elsif, BlockVarNone,
    BlockVarZero, BlockVarSecond, CommandDoBlock, CallNoArgs, ZSuper, When,
    WhenArgsSplat, WhenSplat, RescueClause, Strings, LiteralConcat, XString, Regexp,
    EmptyArray, Words, WordAppend, QWordAppend, StrContent, DVarEnter, DVarEnd,
    DBegEnter, DBegEnd, VarRef, Symbol, DSymbol, IntLiteral, FloatLiteral, NegInt,
    NegFloat, NthRef, BackRef, Empty, Beg, Superclass, ParenArgs, ArgsFull,
    ArgsPreOpt, ArgsPreRest, ArgsPre, ArgsOptRest, ArgsOpt, ArgsRest, ArgsBlock,
    ArgsEmpty, FormalConstant, FormalIvar, FormalGvar, FormalCvar, FormalArg,
    OptArg, RestArg, RestAnon, BlockParam, Singleton, SingletonExpr, AssocArgs,
    ListConcat, Assoc,
}

pub const RUBY_GRAMMAR: &str = r#"
program: @ProgramEnter compstmt => Program

bodystmt: compstmt opt_rescue opt_else opt_ensure => BodyStmt

compstmt: stmts opt_terms => CompStmt

stmts: none => StmtsNone
    | stmt => StmtsOne
    | stmts terms stmt => StmtsAppend
    | error stmt => StmtsRecover

stmt: kALIAS fitem @Fname fitem => Alias
    | kALIAS tGVAR tGVAR => VAlias
    | kALIAS tGVAR tBACK_REF => VAlias
    | kALIAS tGVAR tNTH_REF => VAliasNthRef
    | kUNDEF undef_list => Undef
    | stmt kIF_MOD expr_value => IfMod
    | stmt kUNLESS_MOD expr_value => UnlessMod
    | stmt kWHILE_MOD expr_value => WhileMod
    | stmt kUNTIL_MOD expr_value => UntilMod
    | stmt kRESCUE_MOD stmt => RescueMod
    | klBEGIN @BeginEnter '{' compstmt '}' => BeginBlock
    | klEND '{' compstmt '}' => EndBlock
    | lhs '=' command_call => Assign
    | mlhs '=' command_call => MultiAssignValue
    | var_lhs tOP_ASGN command_call => OpAssign
    | primary_value '[' aref_args ']' tOP_ASGN command_call => OpElementAssign
    | primary_value '.' tIDENTIFIER tOP_ASGN command_call => OpAttrAssign
    | primary_value '.' tCONSTANT tOP_ASGN command_call => OpAttrAssign
    | primary_value tCOLON2 tIDENTIFIER tOP_ASGN command_call => OpAttrAssign
    | backref tOP_ASGN command_call => BackrefAssign
    | lhs '=' mrhs => AssignSValue
    | mlhs '=' arg_value => MultiAssignValue
    | mlhs '=' mrhs => MultiAssign
    | expr

expr: command_call
    | expr kAND expr => And
    | expr kOR expr => Or
    | kNOT expr => Not
    | '!' command_call => Not
    | arg

expr_value: expr => ExprValue

command_call: command
    | block_command
    | kRETURN call_args => ReturnArgs
    | kBREAK call_args => BreakArgs
    | kNEXT call_args => NextArgs

block_command: block_call
    | block_call '.' operation2 command_args => CallArgs
    | block_call tCOLON2 operation2 command_args => CallArgs

cmd_brace_block: tLBRACE_ARG @BlockEnter opt_block_var compstmt '}' => BraceBlock

command: operation command_args %prec tLOWEST => FCallArgs
    | operation command_args cmd_brace_block => FCallArgsBlock
    | primary_value '.' operation2 command_args %prec tLOWEST => CallArgs
    | primary_value '.' operation2 command_args cmd_brace_block => CallArgsBlock
    | primary_value tCOLON2 operation2 command_args %prec tLOWEST => CallArgs
    | primary_value tCOLON2 operation2 command_args cmd_brace_block => CallArgsBlock
    | kSUPER command_args => SuperArgs
    | kYIELD command_args => YieldArgs

mlhs: mlhs_basic
    | tLPAREN mlhs_entry ')' => Second

mlhs_entry: mlhs_basic
    | tLPAREN mlhs_entry ')' => MlhsWrap

mlhs_basic: mlhs_head => MlhsHead
    | mlhs_head mlhs_item => MlhsHeadItem
    | mlhs_head tSTAR mlhs_node => MlhsHeadStar
    | mlhs_head tSTAR => MlhsHeadStarAnon
    | tSTAR mlhs_node => MlhsStar
    | tSTAR => MlhsStarAnon

mlhs_item: mlhs_node
    | tLPAREN mlhs_entry ')' => Second

mlhs_head: mlhs_item ',' => ListNew
    | mlhs_head mlhs_item ',' => MlhsAppend

mlhs_node: variable => Assignable
    | primary_value '[' aref_args ']' => AttrIndex
    | primary_value '.' tIDENTIFIER => AttrSet
    | primary_value tCOLON2 tIDENTIFIER => AttrSet
    | primary_value '.' tCONSTANT => AttrSet
    | primary_value tCOLON2 tCONSTANT => ConstPath
    | tCOLON3 tCONSTANT => ConstTop
    | backref => BackrefAssignError

lhs: variable => Assignable
    | primary_value '[' aref_args ']' => AttrIndex
    | primary_value '.' tIDENTIFIER => AttrSet
    | primary_value tCOLON2 tIDENTIFIER => AttrSet
    | primary_value '.' tCONSTANT => AttrSet
    | primary_value tCOLON2 tCONSTANT => ConstPath
    | tCOLON3 tCONSTANT => ConstTop
    | backref => BackrefAssignError

cname: tIDENTIFIER => ClassNameError
    | tCONSTANT

cpath: tCOLON3 cname => CpathTop
    | cname => CpathName
    | primary_value tCOLON2 cname => CpathScoped

fname: tIDENTIFIER
    | tCONSTANT
    | tFID
    | op => FnameOp
    | reswords => FnameOp

fitem: fname
    | symbol

undef_list: fitem => UndefFirst
    | undef_list ',' @Fname fitem => UndefAppend

op: '|'
    | '^'
    | '&'
    | tCMP
    | tEQ
    | tEQQ
    | tMATCH
    | '>'
    | tGEQ
    | '<'
    | tLEQ
    | tLSHFT
    | tRSHFT
    | '+'
    | '-'
    | '*'
    | tSTAR
    | '/'
    | '%'
    | tPOW
    | '~'
    | tUPLUS
    | tUMINUS
    | tAREF
    | tASET
    | '`'

reswords: k__LINE__
    | k__FILE__
    | klBEGIN
    | klEND
    | kALIAS
    | kAND
    | kBEGIN
    | kBREAK
    | kCASE
    | kCLASS
    | kDEF
    | kDEFINED
    | kDO
    | kELSE
    | kELSIF
    | kEND
    | kENSURE
    | kFALSE
    | kFOR
    | kIN
    | kMODULE
    | kNEXT
    | kNIL
    | kNOT
    | kOR
    | kREDO
    | kRESCUE
    | kRETRY
    | kRETURN
    | kSELF
    | kSUPER
    | kTHEN
    | kTRUE
    | kUNDEF
    | kWHEN
    | kYIELD
    | kIF
    | kUNLESS
    | kWHILE
    | kUNTIL
    | kIF_MOD
    | kUNLESS_MOD
    | kWHILE_MOD
    | kUNTIL_MOD
    | kRESCUE_MOD

arg: lhs '=' arg => Assign
    | lhs '=' arg kRESCUE_MOD arg => AssignRescue
    | var_lhs tOP_ASGN arg => OpAssign
    | primary_value '[' aref_args ']' tOP_ASGN arg => OpElementAssign
    | primary_value '.' tIDENTIFIER tOP_ASGN arg => OpAttrAssign
    | primary_value '.' tCONSTANT tOP_ASGN arg => OpAttrAssign
    | primary_value tCOLON2 tIDENTIFIER tOP_ASGN arg => OpAttrAssign
    | primary_value tCOLON2 tCONSTANT tOP_ASGN arg => ConstReassign
    | tCOLON3 tCONSTANT tOP_ASGN arg => ConstReassign
    | backref tOP_ASGN arg => BackrefAssign
    | arg tDOT2 arg => Dot2
    | arg tDOT3 arg => Dot3
    | arg '+' arg => BinOp
    | arg '-' arg => BinOp
    | arg '*' arg => BinOp
    | arg '/' arg => BinOp
    | arg '%' arg => BinOp
    | arg tPOW arg => BinOp
    | tUMINUS_NUM tINTEGER tPOW arg => NegPow
    | tUMINUS_NUM tFLOAT tPOW arg => NegPow
    | tUPLUS arg => UPlus
    | tUMINUS arg => UMinus
    | arg '|' arg => BinOp
    | arg '^' arg => BinOp
    | arg '&' arg => BinOp
    | arg tCMP arg => BinOp
    | arg '>' arg => BinOp
    | arg tGEQ arg => BinOp
    | arg '<' arg => BinOp
    | arg tLEQ arg => BinOp
    | arg tEQ arg => BinOp
    | arg tEQQ arg => BinOp
    | arg tNEQ arg => Neq
    | arg tMATCH arg => MatchOp
    | arg tNMATCH arg => NMatch
    | '!' arg => Not
    | '~' arg => UnaryOp
    | arg tLSHFT arg => BinOp
    | arg tRSHFT arg => BinOp
    | arg tANDOP arg => And
    | arg tOROP arg => Or
    | kDEFINED opt_nl arg => Defined
    | arg '?' arg ':' arg => Ternary
    | primary

arg_value: arg => ArgValue

aref_args: none
    | command opt_nl => ArefCommand
    | args trailer
    | args ',' tSTAR arg opt_nl => ArefSplat
    | assocs trailer => ArefAssocs
    | tSTAR arg opt_nl => ArefStar

paren_args: '(' none ')' => Second
    | '(' call_args opt_nl ')' => Second
    | '(' block_call opt_nl ')' => ParenBlockCall
    | '(' args ',' block_call opt_nl ')' => ParenArgsBlockCall

opt_paren_args: none
    | paren_args

call_args: command => CallArgsCommand
    | args opt_block_arg => ArgsBlockPass
    | args ',' tSTAR arg_value opt_block_arg => ArgsSplatBlockPass
    | assocs opt_block_arg => AssocsBlockPass
    | assocs ',' tSTAR arg_value opt_block_arg => AssocsSplatBlockPass
    | args ',' assocs opt_block_arg => ArgsAssocsBlockPass
    | args ',' assocs ',' tSTAR arg opt_block_arg => ArgsAssocsSplatBlockPass
    | tSTAR arg_value opt_block_arg => SplatBlockPass
    | block_arg => BlockArgOnly

call_args2: arg_value ',' args opt_block_arg => Args2BlockPass
    | arg_value ',' block_arg => Arg2Block
    | arg_value ',' tSTAR arg_value opt_block_arg => Arg2SplatBlockPass
    | arg_value ',' args ',' tSTAR arg_value opt_block_arg => Args2SplatBlockPass
    | assocs opt_block_arg => AssocsBlockPass
    | assocs ',' tSTAR arg_value opt_block_arg => AssocsSplatBlockPass
    | arg_value ',' assocs opt_block_arg => Arg2AssocsBlockPass
    | arg_value ',' args ',' assocs opt_block_arg => Args2AssocsBlockPass
    | arg_value ',' assocs ',' tSTAR arg_value opt_block_arg => Arg2AssocsSplatBlockPass
    | arg_value ',' args ',' assocs ',' tSTAR arg_value opt_block_arg => Args2AssocsSplatBlockPass
    | tSTAR arg_value opt_block_arg => SplatBlockPass
    | block_arg => BlockArgOnly

command_args: @CmdargPush open_args => CommandArgs

open_args: call_args
    | tLPAREN_ARG @EndArg ')' => OpenArgsEmpty
    | tLPAREN_ARG call_args2 @EndArg ')' => OpenArgsParen

block_arg: tAMPER arg_value => BlockArg

opt_block_arg: ',' block_arg => Second
    | none

args: arg_value => ListNew
    | args ',' arg_value => ArgsAppend

mrhs: args ',' arg_value => ArgsAppend
    | args ',' tSTAR arg_value => ArgsSplat
    | tSTAR arg_value => Splat

primary: literal
    | strings
    | xstring
    | regexp
    | words
    | qwords
    | var_ref
    | backref
    | tFID => FidCall
    | kBEGIN bodystmt kEND => BeginBody
    | tLPAREN_ARG expr @EndArg opt_nl ')' => GroupedExpr
    | tLPAREN compstmt ')' => Second
    | primary_value tCOLON2 tCONSTANT => Colon2
    | tCOLON3 tCONSTANT => Colon3
    | primary_value '[' aref_args ']' => Aref
    | tLBRACK aref_args ']' => ArrayLiteral
    | tLBRACE assoc_list '}' => HashLiteral
    | kRETURN => ReturnBare
    | kYIELD '(' call_args ')' => YieldParen
    | kYIELD '(' ')' => YieldBare
    | kYIELD => YieldBare
    | kDEFINED opt_nl '(' expr ')' => DefinedParen
    | operation brace_block => FCallBlock
    | method_call
    | method_call brace_block => MethodCallBlock
    | kIF expr_value then compstmt if_tail kEND => If
    | kUNLESS expr_value then compstmt opt_else kEND => Unless
    | kWHILE @CondPush expr_value do @CondPop compstmt kEND => While
    | kUNTIL @CondPush expr_value do @CondPop compstmt kEND => Until
    | kCASE expr_value opt_terms case_body kEND => Case
    | kCASE opt_terms case_body kEND => CaseNoSubject
    | kCASE opt_terms kELSE compstmt kEND => CaseElseOnly
    | kFOR block_var kIN @CondPush expr_value do @CondPop compstmt kEND => For
    | kCLASS cpath superclass @ClassEnter bodystmt kEND => Class
    | kCLASS tLSHFT expr @SClassSaveDef term @SClassEnter bodystmt kEND => SClass
    | kMODULE cpath @ModuleEnter bodystmt kEND => Module
    | kDEF fname @DefEnter f_arglist bodystmt kEND => Def
    | kDEF singleton dot_or_colon @Fname fname @DefsEnter f_arglist bodystmt kEND => Defs
    | kBREAK => BreakBare
    | kNEXT => NextBare
    | kREDO => Redo
    | kRETRY => Retry

primary_value: primary => PrimaryValue

then: term
    | ':'
    | kTHEN
    | term kTHEN

do: term
    | ':'
    | kDO_COND

if_tail: opt_else
    | kELSIF expr_value then compstmt if_tail => Elsif

opt_else: none
    | kELSE compstmt => Second

block_var: lhs
    | mlhs

opt_block_var: none => BlockVarNone
    | '|' '|' => BlockVarZero
    | tOROP => BlockVarZero
    | '|' block_var '|' => BlockVarSecond

do_block: kDO_BLOCK @BlockEnter opt_block_var compstmt kEND => BraceBlock

block_call: command do_block => CommandDoBlock
    | block_call '.' operation2 opt_paren_args => CallArgs
    | block_call tCOLON2 operation2 opt_paren_args => CallArgs

method_call: operation paren_args => FCallArgs
    | primary_value '.' operation2 opt_paren_args => CallArgs
    | primary_value tCOLON2 operation2 paren_args => CallArgs
    | primary_value tCOLON2 operation3 => CallNoArgs
    | kSUPER paren_args => SuperArgs
    | kSUPER => ZSuper

brace_block: '{' @BlockEnter opt_block_var compstmt '}' => BraceBlock
    | kDO @BlockEnter opt_block_var compstmt kEND => BraceBlock

case_body: kWHEN when_args then compstmt cases => When

when_args: args
    | args ',' tSTAR arg_value => WhenArgsSplat
    | tSTAR arg_value => WhenSplat

cases: opt_else
    | case_body

opt_rescue: kRESCUE exc_list exc_var then compstmt opt_rescue => RescueClause
    | none

exc_list: arg_value => ListNew
    | mrhs
    | none

exc_var: tASSOC lhs => Second
    | none

opt_ensure: kENSURE compstmt => Second
    | none

literal: numeric
    | symbol
    | dsym

strings: string => Strings

string: string1
    | string string1 => LiteralConcat

string1: tSTRING_BEG string_contents tSTRING_END => Second

xstring: tXSTRING_BEG xstring_contents tSTRING_END => XString

regexp: tREGEXP_BEG xstring_contents tREGEXP_END => Regexp

words: tWORDS_BEG ' ' tSTRING_END => EmptyArray
    | tWORDS_BEG word_list tSTRING_END => Words

word_list:
    | word_list word ' ' => WordAppend

word: string_content
    | word string_content => LiteralConcat

qwords: tQWORDS_BEG ' ' tSTRING_END => EmptyArray
    | tQWORDS_BEG qword_list tSTRING_END => Words

qword_list:
    | qword_list tSTRING_CONTENT ' ' => QWordAppend

string_contents:
    | string_contents string_content => LiteralConcat

xstring_contents:
    | xstring_contents string_content => LiteralConcat

string_content: tSTRING_CONTENT => StrContent
    | tSTRING_DVAR @DVarEnter string_dvar => DVarEnd
    | tSTRING_DBEG @DBegEnter compstmt '}' => DBegEnd

string_dvar: tGVAR => VarRef
    | tIVAR => VarRef
    | tCVAR => VarRef
    | backref

symbol: tSYMBEG sym => Symbol

sym: fname
    | tIVAR
    | tGVAR
    | tCVAR

dsym: tSYMBEG xstring_contents tSTRING_END => DSymbol

numeric: tINTEGER => IntLiteral
    | tFLOAT => FloatLiteral
    | tUMINUS_NUM tINTEGER %prec tLOWEST => NegInt
    | tUMINUS_NUM tFLOAT %prec tLOWEST => NegFloat

variable: tIDENTIFIER
    | tIVAR
    | tGVAR
    | tCONSTANT
    | tCVAR
    | kNIL
    | kSELF
    | kTRUE
    | kFALSE
    | k__FILE__
    | k__LINE__

var_ref: variable => VarRef

var_lhs: variable => Assignable

backref: tNTH_REF => NthRef
    | tBACK_REF => BackRef

superclass: term => Empty
    | '<' @Beg expr term => Superclass
    | error term => Empty

f_arglist: '(' f_args opt_nl ')' => ParenArgs
    | f_args term

f_args: f_arg ',' f_optarg ',' f_rest_arg opt_f_block_arg => ArgsFull
    | f_arg ',' f_optarg opt_f_block_arg => ArgsPreOpt
    | f_arg ',' f_rest_arg opt_f_block_arg => ArgsPreRest
    | f_arg opt_f_block_arg => ArgsPre
    | f_optarg ',' f_rest_arg opt_f_block_arg => ArgsOptRest
    | f_optarg opt_f_block_arg => ArgsOpt
    | f_rest_arg opt_f_block_arg => ArgsRest
    | f_block_arg => ArgsBlock
    | => ArgsEmpty

f_norm_arg: tCONSTANT => FormalConstant
    | tIVAR => FormalIvar
    | tGVAR => FormalGvar
    | tCVAR => FormalCvar
    | tIDENTIFIER => FormalArg

f_arg: f_norm_arg => ListNew
    | f_arg ',' f_norm_arg => ArgsAppend

f_opt: tIDENTIFIER '=' arg_value => OptArg

f_optarg: f_opt => ListNew
    | f_optarg ',' f_opt => ArgsAppend

restarg_mark: '*'
    | tSTAR

f_rest_arg: restarg_mark tIDENTIFIER => RestArg
    | restarg_mark => RestAnon

blkarg_mark: '&'
    | tAMPER

f_block_arg: blkarg_mark tIDENTIFIER => BlockParam

opt_f_block_arg: ',' f_block_arg => Second
    | none

singleton: var_ref => Singleton
    | '(' @Beg expr opt_nl ')' => SingletonExpr

assoc_list: none
    | assocs trailer
    | args trailer => AssocArgs

assocs: assoc
    | assocs ',' assoc => ListConcat

assoc: arg_value tASSOC arg_value => Assoc

operation: tIDENTIFIER
    | tCONSTANT
    | tFID

operation2: tIDENTIFIER
    | tCONSTANT
    | tFID
    | op

operation3: tIDENTIFIER
    | tFID
    | op

dot_or_colon: '.'
    | tCOLON2

opt_terms:
    | terms

opt_nl:
    | '\n'

trailer:
    | '\n'
    | ','

term: ';'
    | '\n'

terms: term
    | terms ';'

none: => Empty
"#;

/// Precedence levels, lowest first.
fn declare_precedence(builder: &mut GrammarBuilder) {
    builder
        .nonassoc(&["tLOWEST"])
        .nonassoc(&["tLBRACE_ARG"])
        .nonassoc(&["kIF_MOD", "kUNLESS_MOD", "kWHILE_MOD", "kUNTIL_MOD"])
        .left(&["kOR", "kAND"])
        .right(&["kNOT"])
        .nonassoc(&["kDEFINED"])
        .right(&["'='", "tOP_ASGN"])
        .left(&["kRESCUE_MOD"])
        .right(&["'?'", "':'"])
        .nonassoc(&["tDOT2", "tDOT3"])
        .left(&["tOROP"])
        .left(&["tANDOP"])
        .nonassoc(&["tCMP", "tEQ", "tEQQ", "tNEQ", "tMATCH", "tNMATCH"])
        .left(&["'>'", "tGEQ", "'<'", "tLEQ"])
        .left(&["'|'", "'^'"])
        .left(&["'&'"])
        .left(&["tLSHFT", "tRSHFT"])
        .left(&["'+'", "'-'"])
        .left(&["'*'", "'/'", "'%'"])
        .right(&["tUMINUS_NUM", "tUMINUS"])
        .right(&["tPOW"])
        .right(&["'!'", "'~'", "tUPLUS"]);
}

/// Parse tables for [`RUBY_GRAMMAR`] and the action of every production.
#[derive(Debug)]
pub struct RubyTables {
    pub tables: ParseTables,
    actions: Vec<Act>,
}

impl RubyTables {
    pub fn build() -> Result<Self, GrammarError> {
        let mut builder = GrammarBuilder::new(TokenKind::ALL.iter().map(|kind| kind.grammar_name()));
        declare_precedence(&mut builder);
        builder.rules(RUBY_GRAMMAR);
        let grammar = builder.build()?;

        let actions = grammar
            .productions()
            .iter()
            .map(|production| match &production.action {
                None => Ok(Act::Default),
                Some(name) => Act::from_name(name).ok_or_else(|| GrammarError::UnknownAction(name.clone())),
            })
            .collect::<Result<Vec<_>, _>>()?;

        let tables = ParseTables::build(&grammar);
        log::debug!(
            "ruby tables: {} states, {} productions, {} shift/reduce conflicts",
            tables.stats.states,
            tables.stats.productions,
            tables.stats.shift_reduce
        );
        Ok(Self { tables, actions })
    }

    /// The shared tables, built on first use.
    pub fn get() -> Result<&'static RubyTables, GrammarError> {
        static TABLES: OnceLock<Result<RubyTables, GrammarError>> = OnceLock::new();
        TABLES.get_or_init(RubyTables::build).as_ref().map_err(Clone::clone)
    }

    #[inline]
    pub fn action(&self, production: u32) -> Act {
        self.actions.get(production as usize).copied().unwrap_or(Act::Default)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_action_is_known() {
        let tables = RubyTables::build().unwrap();
        assert_eq!(tables.actions.len(), tables.tables.len.len());
        assert_eq!(tables.action(0), Act::Default);
    }

    #[test]
    fn test_no_reduce_reduce_conflicts() {
        let tables = RubyTables::get().unwrap();
        assert_eq!(tables.tables.stats.reduce_reduce, 0);
    }

    #[test]
    fn test_action_names() {
        assert_eq!(Act::from_name("Program"), Some(Act::Program));
        assert_eq!(Act::from_name("BraceBlock"), Some(Act::BraceBlock));
        assert_eq!(Act::from_name("Default"), None);
    }
}
