mod pattern;
mod rewrite;
mod shape;
mod tree;
