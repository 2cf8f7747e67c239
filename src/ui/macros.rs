/// Prints `format!`-style arguments under a green category label.
#[macro_export]
macro_rules! blog {
    ($category:expr, $($arg:tt)*) => {
        $crate::ui::StatusUI::labelled($category, &format!($($arg)*))
    };
}

#[macro_export]
macro_rules! blog_warning {
    ($category:expr, $($arg:tt)*) => {
        $crate::ui::StatusUI::labelled_warning($category, &format!($($arg)*))
    };
}
