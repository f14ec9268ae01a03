mod add_filter;
mod get_filters;
mod refresh_filters;
mod remove_filter;
mod update_filter;

pub use add_filter::AddFilterUseCase;
pub use get_filters::GetFiltersUseCase;
pub use refresh_filters::RefreshFiltersUseCase;
pub use remove_filter::RemoveFilterUseCase;
pub use update_filter::UpdateFilterUseCase;
