use iced::widget::{column, row, text, Container};
use iced::{Alignment, Element, Length};

pub const BRAND: &str = "CerminRupa";
const TAGLINE: &str = "Compare two faces with a deep-learning embedding model";

/// Page header shared by every view. Holds no state of its own.
pub fn view<'a, Message: 'a>(page: &'a str) -> Element<'a, Message> {
    let title = row![text(BRAND).size(30), text(page).size(18)]
        .spacing(16)
        .align_y(Alignment::End);

    Container::new(column![title, text(TAGLINE).size(13)].spacing(6))
        .width(Length::Fill)
        .padding([12, 20])
        .into()
}
