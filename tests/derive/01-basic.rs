#![allow(dead_code)]

use graft::Graft;

#[derive(Graft)]
pub struct Model {
    human: bool,
    first: u16,
    fourth: u16,
    core: Vec<String>,
    names: Vec<String>,
}

fn main() {}
