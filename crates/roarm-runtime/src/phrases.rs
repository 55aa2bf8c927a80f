//! Spoken feedback lines in every supported language.

use roarm_types::Language;

/// A line the robot can say.  Text is resolved per [`Language`] at speaking
/// time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Phrase {
    Initiating,
    Ready,
    Parked,
    GreetStart,
    GreetShake,
    GreetEnd,
    GreetFail,
    DanceStart,
    SongLine1,
    SongLine2,
    SongLine3,
    SongLine4,
    DanceEnd,
    EnlightStart,
    EnlightBreak,
    EnlightEnd,
    VoiceChangeStart,
    VoiceChangeEnd,
    LanguageChangeStart,
    LanguageChangeEnd,
    NothingToDo,
}

/// The dance song, sung in a loop.
pub const SONG: [Phrase; 4] = [
    Phrase::SongLine1,
    Phrase::SongLine2,
    Phrase::SongLine3,
    Phrase::SongLine4,
];

impl Phrase {
    pub const ALL: [Phrase; 21] = [
        Phrase::Initiating,
        Phrase::Ready,
        Phrase::Parked,
        Phrase::GreetStart,
        Phrase::GreetShake,
        Phrase::GreetEnd,
        Phrase::GreetFail,
        Phrase::DanceStart,
        Phrase::SongLine1,
        Phrase::SongLine2,
        Phrase::SongLine3,
        Phrase::SongLine4,
        Phrase::DanceEnd,
        Phrase::EnlightStart,
        Phrase::EnlightBreak,
        Phrase::EnlightEnd,
        Phrase::VoiceChangeStart,
        Phrase::VoiceChangeEnd,
        Phrase::LanguageChangeStart,
        Phrase::LanguageChangeEnd,
        Phrase::NothingToDo,
    ];

    pub fn text(self, language: Language) -> &'static str {
        use Language::{English as En, German as De, Polish as Pl};
        match (self, language) {
            (Phrase::Initiating, Pl) => "rozpoczynam inicjalizację",
            (Phrase::Initiating, En) => "initializing",
            (Phrase::Initiating, De) => "initialisierung läuft",

            (Phrase::Ready, Pl) => "gotowy do działania",
            (Phrase::Ready, En) => "ready for action",
            (Phrase::Ready, De) => "bereit",

            (Phrase::Parked, Pl) => "robot odstawiony",
            (Phrase::Parked, En) => "robot parked",
            (Phrase::Parked, De) => "gerät geparkt",

            (Phrase::GreetStart, Pl) => "no podaj łapę!",
            (Phrase::GreetStart, En) => "come on, give me your hand",
            (Phrase::GreetStart, De) => "gib mir deine hand",

            (Phrase::GreetShake, Pl) => "cześć i czołem, kluski z rosołem",
            (Phrase::GreetShake, En) => "cheerio dude, how's your mood?",
            (Phrase::GreetShake, De) => "hallo alter, wie ist die stimmung?",

            (Phrase::GreetEnd, Pl) => "dobra, wystarczy, bo się zagłaskamy",
            (Phrase::GreetEnd, En) => "that's enough, otherwise we'll never stop",
            (Phrase::GreetEnd, De) => "okay, das reicht jetzt",

            (Phrase::GreetFail, Pl) => "nie chcesz? trudno. może jednak się przywitasz?",
            (Phrase::GreetFail, En) => "don't want to? fine. maybe you'll say hello anyway?",
            (Phrase::GreetFail, De) => "du willst nicht? schade. vielleicht sagst du trotzdem hallo?",

            (Phrase::DanceStart, Pl) => "zapraszasz do tańca?",
            (Phrase::DanceStart, En) => "inviting me to dance?",
            (Phrase::DanceStart, De) => "forderst du mich zum tanz auf?",

            (Phrase::SongLine1, Pl) => "przez twe oczy, te oczy zielone oszalałam!",
            (Phrase::SongLine1, En) => "because of your eyes, those green eyes, I went crazy!",
            (Phrase::SongLine1, De) => "wegen deiner grünen augen bin ich verrückt geworden!",

            (Phrase::SongLine2, _) => "lalala!",

            (Phrase::SongLine3, Pl) => "gwiazdy chyba twym oczom oddały cały blask!",
            (Phrase::SongLine3, En) => "the stars must have given all their shine to your eyes!",
            (Phrase::SongLine3, De) => "die sterne haben deinen augen ihren glanz geschenkt!",

            (Phrase::SongLine4, _) => "lalalala!",

            (Phrase::DanceEnd, Pl) => "co to? masz już dość? hehe!",
            (Phrase::DanceEnd, En) => "how come? had enough already? hehe!",
            (Phrase::DanceEnd, De) => "wie bitte? hast du schon genug? hehe!",

            (Phrase::EnlightStart, Pl) => "oświecić cię?",
            (Phrase::EnlightStart, En) => "shall I enlighten you?",
            (Phrase::EnlightStart, De) => "soll ich dich erleuchten?",

            (Phrase::EnlightBreak, Pl) => "naciśnij enter, żeby zakończyć",
            (Phrase::EnlightBreak, En) => "press enter to finish",
            (Phrase::EnlightBreak, De) => "zum beenden die eingabetaste drücken",

            (Phrase::EnlightEnd, Pl) => "oświecenie zakończone",
            (Phrase::EnlightEnd, En) => "enlightenment done",
            (Phrase::EnlightEnd, De) => "erleuchtung abgeschlossen",

            (Phrase::VoiceChangeStart, Pl) => "zmieniam głos",
            (Phrase::VoiceChangeStart, En) => "changing my voice",
            (Phrase::VoiceChangeStart, De) => "ich ändere meine stimme",

            (Phrase::VoiceChangeEnd, Pl) => "tak brzmię teraz",
            (Phrase::VoiceChangeEnd, En) => "this is how I sound now",
            (Phrase::VoiceChangeEnd, De) => "so klinge ich jetzt",

            (Phrase::LanguageChangeStart, Pl) => "zmieniam język",
            (Phrase::LanguageChangeStart, En) => "changing language",
            (Phrase::LanguageChangeStart, De) => "ich wechsle die sprache",

            (Phrase::LanguageChangeEnd, Pl) => "mówię teraz po polsku",
            (Phrase::LanguageChangeEnd, En) => "I speak english now",
            (Phrase::LanguageChangeEnd, De) => "ich spreche jetzt deutsch",

            (Phrase::NothingToDo, Pl) => "nic do zrobienia",
            (Phrase::NothingToDo, En) => "nothing to do",
            (Phrase::NothingToDo, De) => "nichts zu tun",
        }
    }
}
