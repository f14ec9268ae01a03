pub mod filter_lists;

pub use filter_lists::{
    AddFilterUseCase, GetFiltersUseCase, RefreshFiltersUseCase, RemoveFilterUseCase,
    UpdateFilterUseCase,
};
