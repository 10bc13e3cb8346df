//! # Command Tree Registration Macro
//!
//! This procedural macro turns a nested description of an SCPI command
//! hierarchy into the corresponding sequence of `ScpiContext::register`
//! calls, so firmware can declare its whole command surface in one place
//! instead of threading node handles through registration code by hand.
//!
//! ## Macro Input Format
//!
//! ```rust
//! scpi_tree!(ctx, {
//!     "SOURCE" / "SOUR" => {
//!         "FREQUENCY" / "FREQ" => set_frequency;
//!     };
//!     "OUTPUT" / "OUTP" => set_output {
//!         "STATE" / "STAT" => set_output;
//!     };
//!     "IDENTIFY?" / "ID?" => identify;
//!     "STATUS" / "STAT";
//! });
//! ```
//!
//! - `ctx` is a place expression for the `scpi_core::ScpiContext` being
//!   populated.
//! - Each entry is `"LONG" / "SHORT"` followed by an optional
//!   `=> handler` and an optional `{ entries }` block of children, then a
//!   `;`. A name pair with neither becomes a pure namespace node; a node
//!   may carry both a callback and children, as group commands like
//!   `OUTPUT` do.
//! - `handler` is any expression that coerces to `scpi_core::Callback`,
//!   typically a closure or a function path.
//!
//! The expansion registers every node with `Placement::ChildOf`, nesting
//! following the braces, and propagates `RegisterError` with `?`; invoke
//! the macro inside a function returning a compatible `Result`.

use proc_macro::TokenStream;
use proc_macro2::TokenStream as TokenStream2;
use quote::{format_ident, quote};
use syn::{
    Expr, LitStr, Token, braced,
    parse::{Parse, ParseStream},
    parse_macro_input,
};

/// Parsed macro input: the context expression and the top-level entries.
struct TreeMacroInput {
    ctx: Expr,
    entries: Vec<Entry>,
}

/// One `"LONG" / "SHORT" [=> handler] [{ children }];` item.
struct Entry {
    long: LitStr,
    short: LitStr,
    callback: Option<Expr>,
    children: Vec<Entry>,
}

fn parse_entries(input: ParseStream) -> syn::Result<Vec<Entry>> {
    let mut entries = Vec::new();
    while !input.is_empty() {
        entries.push(input.parse()?);
    }
    Ok(entries)
}

fn parse_children(input: ParseStream) -> syn::Result<Vec<Entry>> {
    let content;
    braced!(content in input);
    parse_entries(&content)
}

impl Parse for Entry {
    fn parse(input: ParseStream) -> syn::Result<Self> {
        let long: LitStr = input.parse()?;
        input.parse::<Token![/]>()?;
        let short: LitStr = input.parse()?;

        let mut callback = None;
        let mut children = Vec::new();

        if input.peek(Token![=>]) {
            input.parse::<Token![=>]>()?;
            if input.peek(syn::token::Brace) {
                children = parse_children(input)?;
            } else {
                // Without the eager-brace guard a children block after a
                // path handler would parse as a struct literal.
                callback = Some(Expr::parse_without_eager_brace(input)?);
                if input.peek(syn::token::Brace) {
                    children = parse_children(input)?;
                }
            }
        }
        input.parse::<Token![;]>()?;

        Ok(Entry {
            long,
            short,
            callback,
            children,
        })
    }
}

impl Parse for TreeMacroInput {
    fn parse(input: ParseStream) -> syn::Result<Self> {
        let ctx: Expr = input.parse()?;
        input.parse::<Token![,]>()?;
        let content;
        braced!(content in input);
        Ok(TreeMacroInput {
            ctx,
            entries: parse_entries(&content)?,
        })
    }
}

/// Emits the registration statements for one sibling list.
fn emit_entries(
    ctx: &Expr,
    anchor: &proc_macro2::Ident,
    entries: &[Entry],
    counter: &mut usize,
) -> TokenStream2 {
    let mut output = TokenStream2::new();

    for entry in entries {
        *counter += 1;
        let node = format_ident!("_scpi_node_{}", *counter);
        let long = &entry.long;
        let short = &entry.short;

        let callback = match &entry.callback {
            Some(handler) => quote! {
                {
                    let __scpi_cb: ::scpi_core::context::Callback =
                        ::std::boxed::Box::new(#handler);
                    ::core::option::Option::Some(__scpi_cb)
                }
            },
            None => quote! { ::core::option::Option::None },
        };

        output.extend(quote! {
            let #node = #ctx.register(
                #anchor,
                ::scpi_core::tree::Placement::ChildOf,
                #long,
                #short,
                #callback,
            )?;
        });

        if !entry.children.is_empty() {
            output.extend(emit_entries(ctx, &node, &entry.children, counter));
        }
    }

    output
}

pub fn scpi_tree_impl(input: TokenStream) -> TokenStream {
    let TreeMacroInput { ctx, entries } = parse_macro_input!(input as TreeMacroInput);

    let root = format_ident!("_scpi_node_0");
    let mut counter = 0usize;
    let registrations = emit_entries(&ctx, &root, &entries, &mut counter);

    let expanded = quote! {
        {
            let #root = #ctx.root();
            #registrations
        }
    };

    TokenStream::from(expanded)
}
