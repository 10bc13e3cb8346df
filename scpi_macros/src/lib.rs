extern crate proc_macro;

mod treegen;

use proc_macro::TokenStream;
use treegen::scpi_tree_impl;

/// Declarative SCPI command-tree registration; see the `treegen` module
/// docs for the accepted grammar.
#[proc_macro]
pub fn scpi_tree(input: TokenStream) -> TokenStream {
    scpi_tree_impl(input)
}
