pub mod cont_idx_vec;
pub mod segtree;
pub mod skipvec;
pub mod subset_trie;
pub mod superset_trie;
