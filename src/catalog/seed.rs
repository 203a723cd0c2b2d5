//! Demo catalog loaded at startup by the CLI

use crate::models::{App, CustomerReview, Device};

/// The five demo devices: xPhone, xTablet, Solar System Phone, Flame Book
/// Reader and Personal Computer
pub fn demo_devices() -> [Device; 5] {
    [
        Device::new(Some("Orange"), "xPhone"),
        Device::new(Some("Orange"), "xTablet"),
        Device::new(Some("Song-Sung"), "Solar System Phone"),
        Device::new(Some("Jungle"), "Flame Book Reader"),
        Device::new(None, "Personal Computer"),
    ]
}

/// Twelve demo apps with devices and reviews; one of them is inactive
pub fn demo_catalog() -> Vec<App> {
    let [x_phone, x_tablet, solar_system, flame, pc] = demo_devices();

    vec![
        App::new(
            "The Cloud",
            "cloud.jpg",
            "The Cloud is a place of magic and wonder.  Businesses run smoothly in the Cloud.  \
             Developers no longer need system administrators, or food and water for that matter.  \
             You can watch television on your tablet device from the comfort of your own sofa, \
             without having to look up at the television.  Download the Cloud app, from the Cloud, \
             and harness this awesome power today!",
            "Business",
            7.99,
        )
        .with_devices(vec![x_phone.clone(), x_tablet.clone()])
        .with_reviews(vec![
            CustomerReview::new(
                "fanboy1984",
                5,
                "This app makes my <span style=\"font-weight:bold\">xPhone</span> even more stylish and trendy!",
            ),
            CustomerReview::new(
                "anti.hipster",
                1,
                "I don't understand what 'The Cloud' means.  This seems like more of a catchphrase \
                 than a new technology or app...",
            ),
        ]),
        App::new(
            "Sales Closer",
            "pointing.jpg",
            "A high-powered productivity app for high-powered sales professionals.  Track your \
             high-powered leads, and manage your high-powered schedule.  When you are out on the town \
             doing high-powered networking, you want to show your high-powered sales prospects that \
             you are high-powered too.",
            "Business",
            5.99,
        )
        .with_devices(vec![x_phone.clone(), solar_system.clone()])
        .with_reviews(vec![CustomerReview::new(
            "ShowMeTheMoney",
            5,
            "Great app!  If you have used 'Sales Commander 2000' before, then this interface will \
             feel familiar.",
        )]),
        App::new(
            "World Tournament Football",
            "ball.jpg",
            "This game app offers all the excitement of football (soccer), except that it's played on \
             a touch screen rather than your feet.  So there isn't any of the kicking, or the running, \
             or any of the physical exercise at all.  Other than that, it's pretty much the same.",
            "Games",
            1.99,
        )
        .with_devices(vec![x_tablet.clone(), flame.clone()])
        .with_reviews(vec![CustomerReview::new(
            "RealAmerican",
            2,
            "False advertising... I though this was supposed to be football, but it's a SOCCER game \
             instead.",
        )]),
        App::new(
            "Yet Another Crystal Game",
            "brilliant.jpg",
            "A dazzling game app, in which you connect crystals of the same color to make them go \
             away.  It's sort of like Tetris.  Actually, it's sort of like the other dozen or so other \
             games today where you connect crystals of the same color.",
            "Games",
            0.99,
        )
        .with_devices(vec![flame.clone(), pc.clone()])
        .with_reviews(vec![CustomerReview::new(
            "YetAnotherGamer",
            3,
            "Why is this only supported on two devices?  The other dozen clones of this game are \
             available on all devices.  You should really make this app inactive until more devices \
             are supported...",
        )])
        .with_active(false),
        App::new(
            "Pencil Sharpener",
            "pencil.jpg",
            "Sharpen your pencils, by sticking them into your phone's Bluetooth plug and pushing a \
             button.  This app really pushes your phone's hardware to its limits!",
            "Business",
            2.99,
        )
        .with_devices(vec![x_phone.clone(), solar_system.clone()])
        .with_reviews(vec![
            CustomerReview::new("missing.digits", 1, "Ouch, this app is a menace!  I should sue."),
            CustomerReview::new("LawyerGuy", 5, "@missing.digits:  Private message me.  Let's talk..."),
        ]),
        App::new(
            "Stapler Tracker",
            "stapler.jpg",
            "Is someone always taking your stapler?  It's a common problem in many office spaces.  \
             This business productivity app will help you manage your stapler at all times, so that \
             you will never have to deal with a \"case of the Mondays\" again.",
            "Business",
            0.99,
        )
        .with_devices(vec![pc.clone()])
        .with_reviews(vec![CustomerReview::new(
            "mike.bolton",
            3,
            "'PC LOAD LETTER'?  What does that mean?!?",
        )]),
        App::new(
            "Frustrated Flamingos",
            "flamingo.jpg",
            "A fun little game app, where you throw large birds around for no apparent reason.  Why \
             else do you think they're so frustrated?",
            "Games",
            0.99,
        )
        .with_devices(vec![
            x_phone.clone(),
            x_tablet.clone(),
            solar_system.clone(),
            flame.clone(),
            pc.clone(),
        ])
        .with_reviews(vec![CustomerReview::new(
            "BirdSlinger",
            4,
            "LOL, I love catapulting the flamingos into the cows!  I hate how the advertisement \
             banner hides part of the view, tho.",
        )]),
        App::new(
            "Grype Video Conferencing",
            "laptop.jpg",
            "Make free local and international calls, with video, using this app and your home \
             Internet connection.  Better yet, make free calls using your employer's Internet \
             connection!",
            "Internet",
            3.99,
        )
        .with_devices(vec![x_phone.clone(), x_tablet.clone(), solar_system.clone(), pc.clone()])
        .with_reviews(vec![CustomerReview::new(
            "office.casual",
            4,
            "I wish they had not added video to this app in the latest version.  I liked it much \
             more back when I didn't have to get dressed.",
        )]),
        App::new(
            "E-Book Reader",
            "book.jpg",
            "Read books on your computer, or on the go from your mobile device with this powerful \
             e-reader app.  We recommend \"Hibernate Search by Example\", from Packt Publishing.",
            "Media",
            1.99,
        )
        .with_devices(vec![
            x_phone.clone(),
            x_tablet.clone(),
            solar_system.clone(),
            flame.clone(),
            pc.clone(),
        ])
        .with_reviews(vec![CustomerReview::new(
            "StevePerkins",
            5,
            "This 'Hibernate Search by Example' book is brilliant!  Thanks for the recommendation!",
        )]),
        App::new(
            "Dome Web Browser",
            "orangeswirls.jpg",
            "This amazing app allows us to track all of your online activity.  We can figure out \
             where you live, what you had for breakfast this morning, or what your closest secrets \
             are.  The app also includes a web browser.",
            "Internet",
            0.0,
        )
        .with_devices(vec![solar_system.clone(), flame.clone(), pc.clone()])
        .with_reviews(vec![CustomerReview::new(
            "TinFoilHat",
            1,
            "I uninstalled this app.  If the government would fake a moon landing, then they would \
             definately use my browser history to come after me.",
        )]),
        App::new(
            "Athena Internet Radio",
            "jamming.jpg",
            "Listen to your favorite songs on streaming Internet radio!  When you like a song, this \
             app will play more songs similar to that one.  Or at least it plays more songs... to be \
             honest, sometimes they're not all that similar.  :(",
            "Media",
            3.99,
        )
        .with_devices(vec![
            x_phone.clone(),
            x_tablet.clone(),
            solar_system.clone(),
            flame.clone(),
            pc.clone(),
        ])
        .with_reviews(vec![CustomerReview::new(
            "lskinner",
            5,
            "I requested 'Free Bird', and this app played 'Free Bird'.  What's not to like?",
        )]),
        App::new(
            "Map Journey",
            "compass.jpg",
            "Do you need directions to help you reach a destination?  This GPS app will definitely \
             produce enough turn-by-turn directions to get you there!  Eventually.",
            "Travel",
            0.99,
        )
        .with_devices(vec![x_phone, solar_system, pc])
        .with_reviews(vec![CustomerReview::new(
            "LostInSpace",
            3,
            "Not great... but still WAY better than Orange maps.",
        )]),
    ]
}
